//! Runtime support library for transpiled Lua.
//!
//! Each [`LuaLibFeature`] is one Lua source file under `lua/` defining a
//! global `__TS__<Name>` helper (or a class table such as `Map`). The
//! transformer records which features a file uses; the printer then either
//! inlines [`load_features`] or requires the [`bundle`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// How a transpiled file gets at the support library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LuaLibImportKind {
    /// `require("lualib_bundle")` when any feature is used.
    #[default]
    Require,
    /// `require("lualib_bundle")` in every file.
    Always,
    /// Copy the used features' sources into the file.
    Inline,
    /// Emit nothing; the host provides the helpers.
    None,
}

impl std::str::FromStr for LuaLibImportKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "require" => Ok(LuaLibImportKind::Require),
            "always" => Ok(LuaLibImportKind::Always),
            "inline" => Ok(LuaLibImportKind::Inline),
            "none" => Ok(LuaLibImportKind::None),
            other => Err(format!("unknown lualib import kind: {other}")),
        }
    }
}

macro_rules! lualib_features {
    ($($feature:ident => [$($dependency:ident),*]),* $(,)?) => {
        /// A helper in the support library.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum LuaLibFeature {
            $($feature),*
        }

        impl LuaLibFeature {
            /// Every feature, in bundle order.
            pub const ALL: &'static [LuaLibFeature] = &[$(LuaLibFeature::$feature),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(LuaLibFeature::$feature => stringify!($feature)),*
                }
            }

            /// Features this one calls at runtime.
            pub fn dependencies(self) -> &'static [LuaLibFeature] {
                match self {
                    $(LuaLibFeature::$feature => &[$(LuaLibFeature::$dependency),*]),*
                }
            }

            /// Lua source defining the feature.
            pub fn source(self) -> &'static str {
                match self {
                    $(LuaLibFeature::$feature => {
                        include_str!(concat!("../lua/", stringify!($feature), ".lua"))
                    }),*
                }
            }
        }
    };
}

lualib_features! {
    ArrayConcat => [ArrayIsArray],
    ArrayEvery => [],
    ArrayFilter => [],
    ArrayFind => [],
    ArrayFindIndex => [],
    ArrayFlat => [ArrayIsArray],
    ArrayFlatMap => [ArrayIsArray],
    ArrayForEach => [],
    ArrayIncludes => [],
    ArrayIndexOf => [],
    ArrayIsArray => [],
    ArrayJoin => [],
    ArrayMap => [],
    ArrayPush => [],
    ArrayReduce => [],
    ArrayReduceRight => [],
    ArrayReverse => [],
    ArraySlice => [],
    ArraySome => [],
    ArraySort => [],
    ArraySplice => [],
    ArrayUnshift => [],
    AsyncAwaiter => [Promise, Await],
    Await => [],
    Delete => [],
    Error => [],
    FunctionApply => [Unpack],
    FunctionBind => [Unpack],
    Generator => [],
    InstanceOf => [],
    Iterator => [],
    Map => [Iterator],
    ObjectAssign => [],
    ObjectEntries => [],
    ObjectKeys => [],
    ObjectRest => [],
    ObjectValues => [],
    Promise => [],
    Set => [Iterator],
    SourceMapTraceBack => [],
    Spread => [Iterator, Unpack],
    StringEndsWith => [],
    StringIncludes => [],
    StringPadEnd => [],
    StringPadStart => [],
    StringReplace => [],
    StringSplit => [],
    StringStartsWith => [],
    StringTrim => [],
    TypeOf => [],
    Unpack => [],
}

impl LuaLibFeature {
    /// Feature providing a global of the given name, for library classes
    /// referenced directly from source (`new Map()`, `Promise.resolve`).
    pub fn from_global(name: &str) -> Option<LuaLibFeature> {
        match name {
            "Map" => Some(LuaLibFeature::Map),
            "Set" => Some(LuaLibFeature::Set),
            "Promise" => Some(LuaLibFeature::Promise),
            "Error" | "TypeError" | "RangeError" => Some(LuaLibFeature::Error),
            _ => None,
        }
    }

    /// Name of the Lua global the feature's function is bound to.
    pub fn function_name(self) -> String {
        format!("__TS__{}", self.name())
    }
}

impl std::fmt::Display for LuaLibFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Close `features` over their dependencies. Dependencies come before their
/// dependents; otherwise features keep [`LuaLibFeature::ALL`] order.
pub fn resolve_features(features: &BTreeSet<LuaLibFeature>) -> Vec<LuaLibFeature> {
    let mut resolved = Vec::new();
    let mut visited = BTreeSet::new();
    for feature in features {
        visit(*feature, &mut visited, &mut resolved);
    }
    resolved
}

fn visit(
    feature: LuaLibFeature,
    visited: &mut BTreeSet<LuaLibFeature>,
    resolved: &mut Vec<LuaLibFeature>,
) {
    if !visited.insert(feature) {
        return;
    }
    for dependency in feature.dependencies() {
        visit(*dependency, visited, resolved);
    }
    resolved.push(feature);
}

/// Concatenated sources of `features` and their dependencies, for inline
/// import.
pub fn load_features(features: &BTreeSet<LuaLibFeature>) -> String {
    let resolved = resolve_features(features);
    tracing::debug!(count = resolved.len(), "loading lualib features");
    let mut result = String::new();
    for feature in resolved {
        result.push_str(feature.source());
        if !result.ends_with('\n') {
            result.push('\n');
        }
        result.push('\n');
    }
    result
}

/// The whole library as the `lualib_bundle` module.
pub fn bundle() -> String {
    let all: BTreeSet<LuaLibFeature> = LuaLibFeature::ALL.iter().copied().collect();
    load_features(&all)
}

#[cfg(test)]
mod tests;
