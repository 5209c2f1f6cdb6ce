//! Lua identifier rules.

/// Lua reserved keywords.
pub const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Globals the generated code relies on. Local bindings must not shadow them.
pub const LUA_BUILTINS: &[&str] = &[
    "_G", "assert", "bit", "bit32", "coroutine", "debug", "error", "getmetatable", "ipairs",
    "math", "next", "os", "pairs", "pcall", "print", "rawget", "rawset", "require", "select",
    "self", "setmetatable", "string", "table", "tonumber", "tostring", "type", "unpack",
];

pub fn is_lua_keyword(name: &str) -> bool {
    LUA_KEYWORDS.contains(&name)
}

/// Whether `name` is a bare Lua name that is not a keyword.
pub fn is_valid_lua_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_lua_keyword(name)
}

/// Whether a local binding named `name` has to be renamed in the output.
pub fn is_unsafe_name(name: &str) -> bool {
    !is_valid_lua_identifier(name) || LUA_BUILTINS.contains(&name)
}

/// Rename `name` into a valid Lua identifier.
///
/// Keywords and builtins get a `____` prefix, invalid characters are replaced
/// by `_` followed by their uppercase hex code point.
pub fn fix_invalid_lua_identifier(name: &str) -> String {
    if is_lua_keyword(name) || LUA_BUILTINS.contains(&name) {
        return format!("____{}", name);
    }
    let mut fixed = String::from("____");
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            fixed.push(c);
        } else {
            fixed.push_str(&format!("_{:X}", c as u32));
        }
    }
    fixed
}

/// Turn arbitrary text into an identifier fragment for temp names.
pub fn luaify(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
