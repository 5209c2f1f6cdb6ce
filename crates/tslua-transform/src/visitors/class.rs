//! Classes as metatables.
//!
//! ```lua
//! local Dog = setmetatable({}, Animal)
//! Dog.__index = Dog
//! Dog.__base = Animal
//! Dog.name = "Dog"
//! function Dog.new(construct, ...)
//!     local self = setmetatable(Animal.new(false), Dog)
//!     self.legs = 4
//!     if construct then
//!         Dog.constructor(self, ...)
//!     end
//!     return self
//! end
//! function Dog.constructor(self, name)
//!     Dog.__base.constructor(self, name)
//! end
//! function Dog.bark(self)
//!     print(self.name)
//! end
//! ```
//!
//! A class without a constructor of its own inherits its base's through the
//! metatable chain. Root classes get an empty one.

use rhizome_tslua_ast as lua;
use rhizome_tslua_ast::NodeFlags;
use rhizome_tslua_syntax_typescript as ts;
use rhizome_tslua_syntax_typescript::{
    AnnotationKind, CallExpression, ClassDeclaration, ClassMemberKind, ContextType, PropertyName, Span, SymbolId,
};

use crate::context::{ClassFrame, TransformationContext};
use crate::diagnostics::DiagnosticCode;
use crate::error::TransformError;
use crate::lua_ast;

use super::call;
use super::function::{FunctionExtras, transform_function_like};
use super::identifier::{self, create_local_identifier};
use super::literal::transform_property_name;
use super::variable::{self, Binding};

const CONSTRUCT: &str = "construct";

pub(crate) fn transform_class_declaration<'a>(
    statement: &'a ts::Statement,
    context: &mut TransformationContext<'a>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let ts::StatementKind::Class(class) = &statement.kind else {
        return Ok(Vec::new());
    };
    let range = lua_ast::range(statement.span);
    if class.modifiers.declare {
        if let Some(name) = &class.name {
            identifier::check_ambient_name(context, &name.name, name.span);
        }
        return Ok(Vec::new());
    }

    let symbol = context.checker.class_symbol(class);
    if let Some(target) = extension_target(class) {
        return lower_extension(context, class, symbol, target);
    }

    let base = transform_base(context, class)?;
    let table = class_table(base.as_ref());

    let (mut statements, reference) = match &class.name {
        Some(name) => {
            let binding = Binding {
                symbol: symbol.or_else(|| context.symbol_of(name.id)),
                name: name.name.clone(),
                span: name.span,
            };
            let statements =
                variable::create_local_or_exported_or_global_declaration(context, &[binding.clone()], vec![table])?;
            let reference = variable::binding_target(context, &binding);
            (statements, reference)
        }
        None => {
            // `export default class {}`
            let target = lua::Expression::field(lua_ast::exports(), "default");
            (vec![lua::Statement::assign_one(target.clone(), table)], target)
        }
    };
    let class_name = class.name.as_ref().map_or("default", |name| name.name.as_str());
    statements.extend(lower_members(context, class, symbol, class_name, reference.clone(), base)?);

    if class.modifiers.export && class.modifiers.default && class.name.is_some() {
        statements.push(lua::Statement::assign_one(
            lua::Expression::field(lua_ast::exports(), "default"),
            reference,
        ));
    }
    Ok(statements
        .into_iter()
        .map(|statement| statement.with_range(range))
        .collect())
}

/// `class {}` in an expression builds the class in front of it and yields
/// its table.
pub(crate) fn transform_class_expression<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let ts::ExpressionKind::Class(class) = &expression.kind else {
        return Ok(None);
    };
    let range = lua_ast::range(expression.span);
    let symbol = context.checker.class_symbol(class);
    let local = match &class.name {
        Some(name) => create_local_identifier(context, symbol, &name.name, name.span),
        None => lua::Identifier::new(context.create_temp_name("class")),
    };
    let class_name = class.name.as_ref().map_or("", |name| name.name.as_str());

    let base = transform_base(context, class)?;
    context.add_preceding_statement(lua::Statement::local_one(local.clone(), Some(class_table(base.as_ref()))))?;
    let members = lower_members(context, class, symbol, class_name, local.clone().into(), base)?;
    context.add_preceding_statements(members)?;
    Ok(Some(lua::Expression::from(local).with_range(range)))
}

/// `super` on its own is the base class table.
pub(crate) fn transform_super_keyword<'a>(
    expression: &'a ts::Expression,
    context: &mut TransformationContext<'a>,
) -> Result<Option<lua::Expression>, TransformError> {
    let range = lua_ast::range(expression.span);
    Ok(Some(base_reference(context, expression.span).with_range(range)))
}

/// `super(a)` → `C.__base.constructor(self, a)`.
pub(crate) fn transform_super_call<'a>(
    context: &mut TransformationContext<'a>,
    call: &'a CallExpression,
) -> Result<lua::Expression, TransformError> {
    let base = base_reference(context, call.callee.span);
    let mut arguments = call::transform_arguments(context, &call.arguments, None)?;
    arguments.insert(0, lua::Expression::identifier(lua_ast::SELF));
    Ok(lua::Expression::call(lua::Expression::field(base, "constructor"), arguments))
}

/// `super.m(a)` → `C.__base.m(self, a)`.
pub(crate) fn transform_super_method_call<'a>(
    context: &mut TransformationContext<'a>,
    name: &str,
    call: &'a CallExpression,
) -> Result<lua::Expression, TransformError> {
    let base = base_reference(context, call.callee.span);
    let signature = context.checker.type_of(&call.callee).signature();
    let mut arguments = call::transform_arguments(context, &call.arguments, signature)?;
    arguments.insert(0, lua::Expression::identifier(lua_ast::SELF));
    Ok(lua::Expression::call(lua::Expression::field(base, name), arguments))
}

fn base_reference(context: &mut TransformationContext<'_>, span: Span) -> lua::Expression {
    match context.current_class() {
        Some(frame) => lua::Expression::field(frame.reference.clone(), "__base"),
        None => {
            context.diagnose(span, DiagnosticCode::UnsupportedKind, "'super' used outside of a class");
            lua::Expression::nil()
        }
    }
}

/// Lower the `extends` clause, moving it to a temp unless it is a plain name.
fn transform_base<'a>(
    context: &mut TransformationContext<'a>,
    class: &'a ClassDeclaration,
) -> Result<Option<lua::Expression>, TransformError> {
    let Some(extends) = &class.extends else {
        return Ok(None);
    };
    let base = context.transform_expression(extends)?;
    Ok(Some(context.move_to_preceding_temp(base, Some(extends))?))
}

/// `{}`, or `setmetatable({}, Base)` so static members are inherited.
fn class_table(base: Option<&lua::Expression>) -> lua::Expression {
    let table = lua::Expression::table(Vec::new());
    match base {
        Some(base) => lua::Expression::call(lua::Expression::identifier("setmetatable"), vec![table, base.clone()]),
        None => table,
    }
}

fn lower_members<'a>(
    context: &mut TransformationContext<'a>,
    class: &'a ClassDeclaration,
    symbol: Option<SymbolId>,
    class_name: &str,
    reference: lua::Expression,
    base: Option<lua::Expression>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let mut statements = vec![lua::Statement::assign_one(
        lua::Expression::field(reference.clone(), "__index"),
        reference.clone(),
    )];
    if let Some(base) = &base {
        statements.push(lua::Statement::assign_one(
            lua::Expression::field(reference.clone(), "__base"),
            base.clone(),
        ));
    }
    statements.push(lua::Statement::assign_one(
        lua::Expression::field(reference.clone(), "name"),
        lua::Expression::string(class_name),
    ));

    context.push_class(ClassFrame {
        symbol,
        reference: reference.clone(),
        static_initializer: false,
    });
    let lowered = lower_class_body(context, class, &reference, base.as_ref());
    context.pop_class();
    statements.extend(lowered?);
    Ok(statements)
}

fn lower_class_body<'a>(
    context: &mut TransformationContext<'a>,
    class: &'a ClassDeclaration,
    reference: &lua::Expression,
    base: Option<&lua::Expression>,
) -> Result<Vec<lua::Statement>, TransformError> {
    let mut statements = vec![transform_new_function(context, class, reference, base)?];

    match class.constructor() {
        Some(constructor) => {
            let function = transform_function_like(
                context,
                constructor,
                FunctionExtras {
                    context: Some(ContextType::NonVoid),
                    parameter_properties: true,
                },
            )?
            .with_flags(NodeFlags::DECLARATION);
            statements.push(lua::Statement::assign_one(
                lua::Expression::field(reference.clone(), "constructor"),
                function,
            ));
        }
        None if base.is_none() => {
            let function = lua::Expression::function(
                vec![lua::Identifier::new(lua_ast::SELF)],
                false,
                lua::Block::default(),
                NodeFlags::DECLARATION,
            );
            statements.push(lua::Statement::assign_one(
                lua::Expression::field(reference.clone(), "constructor"),
                function,
            ));
        }
        None => {}
    }

    statements.extend(lower_methods(context, class, reference)?);
    statements.extend(lower_static_fields(context, class, reference)?);
    Ok(statements)
}

/// `C.new(construct, ...)`: allocate, run field initializers, then the
/// constructor when `construct` is set. Subclasses pass `false` to their
/// base so only the most derived constructor runs.
fn transform_new_function<'a>(
    context: &mut TransformationContext<'a>,
    class: &'a ClassDeclaration,
    reference: &lua::Expression,
    base: Option<&lua::Expression>,
) -> Result<lua::Statement, TransformError> {
    let allocated = match base {
        Some(base) => lua::Expression::call(
            lua::Expression::field(base.clone(), "new"),
            vec![lua::Expression::boolean(false)],
        ),
        None => lua::Expression::table(Vec::new()),
    };
    let this: lua::Expression = lua::Expression::identifier(lua_ast::SELF);
    let mut body = vec![lua::Statement::local_one(
        lua::Identifier::new(lua_ast::SELF),
        Some(lua::Expression::call(
            lua::Expression::identifier("setmetatable"),
            vec![allocated, reference.clone()],
        )),
    )];

    for member in class.members.iter().filter(|member| !member.is_static) {
        let ClassMemberKind::Property {
            name,
            initializer: Some(initializer),
            ..
        } = &member.kind
        else {
            continue;
        };
        let (preceding, (key, value)) = context.with_preceding_frame(|context| {
            let key = transform_property_name(context, name)?;
            let value = context.transform_expression(initializer)?;
            Ok((key, value))
        })?;
        body.extend(preceding);
        body.push(
            lua::Statement::assign_one(lua::Expression::table_index(this.clone(), key), value)
                .with_range(lua_ast::range(member.span)),
        );
    }

    let constructor = lua::Expression::call(
        lua::Expression::field(reference.clone(), "constructor"),
        vec![this.clone(), lua::Expression::dots()],
    );
    body.push(lua_ast::if_block(
        lua::Expression::identifier(CONSTRUCT),
        vec![lua::Statement::expression(constructor)],
    ));
    body.push(lua::Statement::ret(vec![this]));

    let function = lua::Expression::function(
        vec![lua::Identifier::new(CONSTRUCT)],
        true,
        lua::Block::new(body),
        NodeFlags::DECLARATION,
    );
    Ok(lua::Statement::assign_one(lua::Expression::field(reference.clone(), "new"), function))
}

/// Methods and accessors, static or not, in declaration order.
fn lower_methods<'a>(
    context: &mut TransformationContext<'a>,
    class: &'a ClassDeclaration,
    reference: &lua::Expression,
) -> Result<Vec<lua::Statement>, TransformError> {
    let mut statements = Vec::new();
    for member in &class.members {
        let (target, function) = match &member.kind {
            ClassMemberKind::Method { name, function } if function.body.is_some() => {
                (member_target(context, reference, name, None)?, function)
            }
            ClassMemberKind::Getter { name, function } if function.body.is_some() => {
                (member_target(context, reference, name, Some("get__"))?, function)
            }
            ClassMemberKind::Setter { name, function } if function.body.is_some() => {
                (member_target(context, reference, name, Some("set__"))?, function)
            }
            _ => continue,
        };
        let lowered =
            transform_function_like(context, function, FunctionExtras::default())?.with_flags(NodeFlags::DECLARATION);
        statements.push(lua::Statement::assign_one(target, lowered).with_range(lua_ast::range(member.span)));

        if let ClassMemberKind::Method { name, .. } = &member.kind {
            if !member.is_static && name.text().as_deref() == Some("toString") {
                statements.push(lua::Statement::assign_one(
                    lua::Expression::field(reference.clone(), "__tostring"),
                    lua::Expression::field(reference.clone(), "toString"),
                ));
            }
        }
    }
    Ok(statements)
}

/// `C.x = v` for static fields, with `this` bound to the class table.
fn lower_static_fields<'a>(
    context: &mut TransformationContext<'a>,
    class: &'a ClassDeclaration,
    reference: &lua::Expression,
) -> Result<Vec<lua::Statement>, TransformError> {
    let mut statements = Vec::new();
    for member in class.members.iter().filter(|member| member.is_static) {
        let ClassMemberKind::Property {
            name,
            initializer: Some(initializer),
            ..
        } = &member.kind
        else {
            continue;
        };
        let symbol = context.current_class().and_then(|frame| frame.symbol);
        context.push_class(ClassFrame {
            symbol,
            reference: reference.clone(),
            static_initializer: true,
        });
        let lowered = context.with_preceding_frame(|context| {
            let key = transform_property_name(context, name)?;
            let value = context.transform_expression(initializer)?;
            Ok((key, value))
        });
        context.pop_class();
        let (preceding, (key, value)) = lowered?;
        statements.extend(preceding);
        statements.push(
            lua::Statement::assign_one(lua::Expression::table_index(reference.clone(), key), value)
                .with_range(lua_ast::range(member.span)),
        );
    }
    Ok(statements)
}

/// `C.m`, or `C.get__m` / `C.set__m` for accessors, whose names must be
/// known statically.
fn member_target<'a>(
    context: &mut TransformationContext<'a>,
    reference: &lua::Expression,
    name: &'a PropertyName,
    accessor_prefix: Option<&str>,
) -> Result<lua::Expression, TransformError> {
    let Some(prefix) = accessor_prefix else {
        let key = transform_property_name(context, name)?;
        return Ok(lua::Expression::table_index(reference.clone(), key));
    };
    match name.text() {
        Some(text) => Ok(lua::Expression::field(reference.clone(), format!("{}{}", prefix, text))),
        None => {
            context.diagnose(
                name.span,
                DiagnosticCode::UnsupportedKind,
                "Accessors with computed names are not supported",
            );
            Ok(lua::Expression::table_index(
                reference.clone(),
                transform_property_name(context, name)?,
            ))
        }
    }
}

// =============================================================================
// Extension classes
// =============================================================================

/// Table an `@extension` or `@metaExtension` class adds its members to.
fn extension_target(class: &ClassDeclaration) -> Option<lua::Expression> {
    let class_name = class.name.as_ref().map(|name| name.name.clone());
    if let Some(annotation) = ts::find_annotation(&class.annotations, AnnotationKind::Extension) {
        let name = annotation.args.first().cloned().or_else(|| extended_name(class)).or(class_name)?;
        return Some(lua::Expression::path(&name));
    }
    if let Some(annotation) = ts::find_annotation(&class.annotations, AnnotationKind::MetaExtension) {
        let name = annotation.args.first().cloned().or_else(|| extended_name(class))?;
        let registry = lua::Expression::call(lua::Expression::path("debug.getregistry"), Vec::new());
        return Some(lua::Expression::table_index(registry, lua::Expression::string(name)));
    }
    None
}

fn extended_name(class: &ClassDeclaration) -> Option<String> {
    class.extends.as_ref()?.as_identifier().map(str::to_string)
}

/// Methods and static fields are assigned onto the extended table. An
/// extension has no instances of its own, so instance fields are rejected.
fn lower_extension<'a>(
    context: &mut TransformationContext<'a>,
    class: &'a ClassDeclaration,
    symbol: Option<SymbolId>,
    target: lua::Expression,
) -> Result<Vec<lua::Statement>, TransformError> {
    let mut statements = Vec::new();
    let reference = if context.is_stable(&target) {
        target
    } else {
        let temp = lua::Identifier::new(context.create_temp_name("extension"));
        statements.push(lua::Statement::local_one(temp.clone(), Some(target)));
        temp.into()
    };

    for member in &class.members {
        if let ClassMemberKind::Property {
            initializer: Some(_), ..
        } = &member.kind
        {
            if !member.is_static {
                context.diagnose(
                    member.span,
                    DiagnosticCode::UnsupportedKind,
                    "Extension classes cannot have instance fields",
                );
            }
        }
    }

    context.push_class(ClassFrame {
        symbol,
        reference: reference.clone(),
        static_initializer: false,
    });
    let lowered = lower_methods(context, class, &reference).and_then(|mut methods| {
        methods.extend(lower_static_fields(context, class, &reference)?);
        Ok(methods)
    });
    context.pop_class();
    statements.extend(lowered?);
    Ok(statements)
}
