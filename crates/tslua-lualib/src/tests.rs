//! Tests for the support library catalog and its Lua sources.

use std::collections::BTreeSet;

use mlua::Lua;

use super::*;

fn set(features: &[LuaLibFeature]) -> BTreeSet<LuaLibFeature> {
    features.iter().copied().collect()
}

/// Run `code` after loading the whole bundle and return its result as a string.
fn eval(code: &str) -> String {
    let lua = Lua::new();
    lua.load(bundle()).exec().expect("bundle failed to load");
    let value: mlua::Value = lua.load(code).eval().expect("lua error");
    match value {
        mlua::Value::String(s) => s.to_str().expect("utf8").to_string(),
        mlua::Value::Integer(i) => i.to_string(),
        mlua::Value::Number(n) if n.fract() == 0.0 => (n as i64).to_string(),
        mlua::Value::Number(n) => n.to_string(),
        mlua::Value::Boolean(b) => b.to_string(),
        mlua::Value::Nil => "nil".to_string(),
        other => format!("{:?}", other),
    }
}

#[test]
fn test_feature_names() {
    assert_eq!(LuaLibFeature::ArrayConcat.name(), "ArrayConcat");
    assert_eq!(LuaLibFeature::ArrayConcat.function_name(), "__TS__ArrayConcat");
    assert_eq!(LuaLibFeature::SourceMapTraceBack.to_string(), "SourceMapTraceBack");
}

#[test]
fn test_every_feature_has_source() {
    for feature in LuaLibFeature::ALL {
        assert!(!feature.source().trim().is_empty(), "{} is empty", feature);
    }
}

#[test]
fn test_resolve_puts_dependencies_first() {
    let resolved = resolve_features(&set(&[LuaLibFeature::Spread]));
    assert_eq!(
        resolved,
        vec![
            LuaLibFeature::Iterator,
            LuaLibFeature::Unpack,
            LuaLibFeature::Spread
        ]
    );
}

#[test]
fn test_resolve_is_deterministic_and_deduplicated() {
    let features = set(&[
        LuaLibFeature::Set,
        LuaLibFeature::Map,
        LuaLibFeature::ArrayFlat,
        LuaLibFeature::ArrayConcat,
    ]);
    let first = resolve_features(&features);
    let second = resolve_features(&features);
    assert_eq!(first, second);
    let iterator_count = first
        .iter()
        .filter(|f| **f == LuaLibFeature::Iterator)
        .count();
    assert_eq!(iterator_count, 1);
    assert_eq!(first[0], LuaLibFeature::ArrayIsArray);
}

#[test]
fn test_load_features_contains_only_requested() {
    let source = load_features(&set(&[LuaLibFeature::ArrayMap]));
    assert!(source.contains("function __TS__ArrayMap"));
    assert!(!source.contains("__TS__ArrayFilter"));
}

#[test]
fn test_from_global() {
    assert_eq!(LuaLibFeature::from_global("Map"), Some(LuaLibFeature::Map));
    assert_eq!(LuaLibFeature::from_global("TypeError"), Some(LuaLibFeature::Error));
    assert_eq!(LuaLibFeature::from_global("Object"), None);
}

#[test]
fn test_bundle_loads_in_luajit() {
    let lua = Lua::new();
    lua.load(bundle()).exec().expect("bundle failed to load");
}

#[test]
fn test_inline_features_load_standalone() {
    let lua = Lua::new();
    let source = load_features(&set(&[LuaLibFeature::Spread, LuaLibFeature::ArrayConcat]));
    lua.load(&source).exec().expect("inline features failed to load");
    let length: i64 = lua
        .load("return select('#', __TS__Spread({1, 2, 3}))")
        .eval()
        .expect("spread");
    assert_eq!(length, 3);
}

#[test]
fn test_array_helpers() {
    assert_eq!(
        eval("return table.concat(__TS__ArrayMap({1, 2, 3}, function(_, v, i) return v * 10 + i end), ',')"),
        "10,21,32"
    );
    assert_eq!(
        eval("return table.concat(__TS__ArrayFilter({1, 2, 3, 4}, function(_, v) return v % 2 == 0 end), ',')"),
        "2,4"
    );
    assert_eq!(
        eval("return __TS__ArrayReduce({1, 2, 3}, function(_, a, b) return a + b end, 10)"),
        "16"
    );
    assert_eq!(eval("return __TS__ArrayIndexOf({'a', 'b'}, 'b')"), "1");
    assert_eq!(eval("return __TS__ArrayIndexOf({'a', 'b'}, 'c')"), "-1");
    assert_eq!(eval("return __TS__ArrayFindIndex({5, 6}, function(_, v) return v == 6 end)"), "1");
    assert_eq!(eval("return __TS__ArrayJoin({1, 'a', true}, '-')"), "1-a-true");
}

#[test]
fn test_array_slice_and_splice() {
    assert_eq!(
        eval("return table.concat(__TS__ArraySlice({1, 2, 3, 4}, 1, -1), ',')"),
        "2,3"
    );
    assert_eq!(
        eval(
            "local a = {1, 2, 3, 4}\n\
             local removed = __TS__ArraySplice(a, 1, 2, 'x')\n\
             return table.concat(a, ',') .. '|' .. table.concat(removed, ',')"
        ),
        "1,x,4|2,3"
    );
}

#[test]
fn test_array_concat_and_flat() {
    assert_eq!(
        eval("return table.concat(__TS__ArrayConcat({1}, {2, 3}, 4), ',')"),
        "1,2,3,4"
    );
    assert_eq!(
        eval("return table.concat(__TS__ArrayFlat({1, {2, {3}}}, 2), ',')"),
        "1,2,3"
    );
}

#[test]
fn test_string_helpers() {
    assert_eq!(
        eval("return table.concat(__TS__StringSplit('a,b,,c', ','), '|')"),
        "a|b||c"
    );
    assert_eq!(eval("return __TS__StringPadStart('5', 3, '0')"), "005");
    assert_eq!(eval("return __TS__StringPadEnd('ab', 5)"), "ab   ");
    assert_eq!(eval("return __TS__StringReplace('a.b.c', '.', '-')"), "a-b.c");
    assert_eq!(eval("return __TS__StringTrim('  hi  ')"), "hi");
    assert_eq!(eval("return __TS__StringStartsWith('hello', 'he')"), "true");
    assert_eq!(eval("return __TS__StringEndsWith('hello', 'lo')"), "true");
    assert_eq!(eval("return __TS__StringIncludes('a.b', '.')"), "true");
}

#[test]
fn test_map_keeps_insertion_order() {
    assert_eq!(
        eval(
            "local m = Map.new(true)\n\
             m:set('b', 1)\n\
             m:set('a', 2)\n\
             m:set('c', 3)\n\
             m:delete('a')\n\
             return table.concat(m:keys(), ',') .. ':' .. m.size"
        ),
        "b,c:2"
    );
}

#[test]
fn test_set_iterates_through_iterator() {
    assert_eq!(
        eval(
            "local s = Set.new(true, {3, 1, 3, 2})\n\
             local out = {}\n\
             for _, v in __TS__Iterator(s) do out[#out + 1] = v end\n\
             return table.concat(out, ',')"
        ),
        "3,1,2"
    );
}

#[test]
fn test_error_classes() {
    assert_eq!(
        eval("local e = TypeError.new(true, 'bad') return tostring(e)"),
        "TypeError: bad"
    );
    assert_eq!(
        eval("return __TS__InstanceOf(RangeError.new(true, 'x'), Error)"),
        "true"
    );
    assert_eq!(eval("return __TS__InstanceOf({}, Error)"), "false");
}

#[test]
fn test_generator_protocol() {
    assert_eq!(
        eval(
            "local g = __TS__Generator(function() coroutine.yield(1) coroutine.yield(2) return 3 end)\n\
             local a = g:next() local b = g:next() local c = g:next() local d = g:next()\n\
             return a.value .. b.value .. c.value .. tostring(c.done) .. tostring(d.done)"
        ),
        "123truetrue"
    );
}

#[test]
fn test_async_awaiter_resolves() {
    assert_eq!(
        eval(
            "local result\n\
             local p = __TS__AsyncAwaiter(function()\n\
                 local v = __TS__Await(Promise.resolve(20))\n\
                 return v + 1\n\
             end)\n\
             p['then'](p, function(_, v) result = v end)\n\
             return result"
        ),
        "21"
    );
}

#[test]
fn test_promise_rejection_reaches_catch() {
    assert_eq!(
        eval(
            "local caught\n\
             local p = Promise.new(true, function(_, resolve, reject) reject(nil, 'no') end)\n\
             p:catch(function(_, reason) caught = reason end)\n\
             return caught"
        ),
        "no"
    );
}

#[test]
fn test_object_helpers() {
    assert_eq!(
        eval(
            "local r = __TS__ObjectRest({a = 1, b = 2, c = 3}, {a = true})\n\
             return tostring(r.a) .. r.b .. r.c"
        ),
        "nil23"
    );
    assert_eq!(
        eval("local t = __TS__ObjectAssign({a = 1}, {b = 2}, nil) return t.a + t.b"),
        "3"
    );
    assert_eq!(eval("return #__TS__ObjectKeys({x = 1, y = 2})"), "2");
}

#[test]
fn test_typeof() {
    assert_eq!(eval("return __TS__TypeOf({})"), "object");
    assert_eq!(eval("return __TS__TypeOf(nil)"), "undefined");
    assert_eq!(eval("return __TS__TypeOf(print)"), "function");
}

#[test]
fn test_function_bind_prepends_arguments() {
    assert_eq!(
        eval(
            "local function add(self, a, b) return self.base + a + b end\n\
             local bound = __TS__FunctionBind(add, {base = 100}, 1)\n\
             return bound(nil, 2)"
        ),
        "103"
    );
}

#[test]
fn test_import_kind_parsing() {
    assert_eq!("inline".parse::<LuaLibImportKind>(), Ok(LuaLibImportKind::Inline));
    assert_eq!("none".parse::<LuaLibImportKind>(), Ok(LuaLibImportKind::None));
    assert!("bundle".parse::<LuaLibImportKind>().is_err());
    assert_eq!(LuaLibImportKind::default(), LuaLibImportKind::Require);
}
