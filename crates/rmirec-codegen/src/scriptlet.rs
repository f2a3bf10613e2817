//! Object graph compiler.
//!
//! Compiles a [`Value`] and everything reachable from it into a
//! [`Scriptlet`]: source text that rebuilds an equivalent value in a
//! Java-like replay interpreter. Each object gets one construction block;
//! later references to an object already compiled by the same
//! [`ScriptletGenerator`] become a plain alias of the earlier variable, so
//! shared and cyclic graphs compile once and always terminate. Chains of
//! nested objects are followed up to [`GeneratorOptions::max_depth`].

use std::collections::HashMap;

use indexmap::IndexMap;
use rmirec_core::value::PROPERTIES_CLASS;
use rmirec_core::{
    CoreError, Field, FieldSlot, Heap, Object, ObjectId, StructObject, TypeDesc, Value,
};

use crate::error::CodegenError;
use crate::literal::{class_literal, scalar_literal, scalar_type_name, string_literal};
use crate::naming;
use crate::GeneratorOptions;

/// Generated source split into a declaration section (banners for
/// structured objects) and a statement section (the code that builds the
/// value).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scriptlet {
    pub declarations: String,
    pub statements: String,
}

impl Scriptlet {
    fn statement(statements: String) -> Self {
        Scriptlet {
            declarations: String::new(),
            statements,
        }
    }

    fn append(&mut self, other: Scriptlet) {
        self.declarations.push_str(&other.declarations);
        self.statements.push_str(&other.statements);
    }

    /// Joins both sections with `separator` between them.
    pub fn render(&self, separator: &str) -> String {
        format!("{}\n{}\n\n{}", self.declarations, separator, self.statements)
    }
}

/// Compiles values from one heap, remembering which objects already have a
/// variable.
///
/// Use a fresh generator per call record: the identity table is only
/// meaningful for the heap it was created with.
pub struct ScriptletGenerator<'a> {
    heap: &'a Heap,
    options: &'a GeneratorOptions,
    generated: HashMap<ObjectId, String>,
    /// Objects currently being compiled, outermost first.
    depth: usize,
}

impl<'a> ScriptletGenerator<'a> {
    pub fn new(heap: &'a Heap, options: &'a GeneratorOptions) -> Self {
        ScriptletGenerator {
            heap,
            options,
            generated: HashMap::new(),
            depth: 0,
        }
    }

    pub fn heap(&self) -> &'a Heap {
        self.heap
    }

    /// Variable already holding object `id`, if it has been compiled.
    pub fn generated_name(&self, id: ObjectId) -> Option<&str> {
        self.generated.get(&id).map(String::as_str)
    }

    /// Base variable name for `value`, see [`naming::variable_name_for`].
    pub fn variable_name_for(&self, value: &Value) -> Result<String, CodegenError> {
        Ok(naming::variable_name_for(self.heap, value)?)
    }

    /// Compiles `value` into `var` and renders both sections.
    pub fn generate(
        &mut self,
        value: &Value,
        var: &str,
        hint: Option<&TypeDesc>,
    ) -> Result<String, CodegenError> {
        let scriptlet = self.compile(value, var, hint)?;
        Ok(scriptlet.render(&self.options.separator))
    }

    /// Compiles `value` into a scriptlet that leaves it in variable `var`.
    ///
    /// `hint` is the declared type to use when the value itself carries no
    /// type (null).
    pub fn compile(
        &mut self,
        value: &Value,
        var: &str,
        hint: Option<&TypeDesc>,
    ) -> Result<Scriptlet, CodegenError> {
        match value {
            Value::Null => Ok(Scriptlet::statement(match hint {
                Some(ty) => format!("{} {var} = null;/* Null */\n", ty.canonical_name()),
                None => format!("{var} = null;/* Null */\n"),
            })),
            Value::Class(ty) => Ok(Scriptlet::statement(format!(
                "Class {var} = {};\n",
                class_literal(ty)
            ))),
            Value::Ref(id) => self.compile_object(*id, var),
            Value::Char(c) if c.len_utf16() > 1 => Err(CoreError::CharOutsideBmp(*c).into()),
            scalar => match (scalar_type_name(scalar), scalar_literal(scalar)) {
                (Some(ty), Some(literal)) => {
                    Ok(Scriptlet::statement(format!("{ty} {var} = {literal};\n")))
                }
                _ => Ok(Scriptlet::default()),
            },
        }
    }

    fn compile_object(&mut self, id: ObjectId, var: &str) -> Result<Scriptlet, CodegenError> {
        let heap = self.heap;
        let object = heap.get(id)?;

        if let Some(previous) = self.generated.get(&id) {
            let ty = object.runtime_type().canonical_name();
            return Ok(Scriptlet::statement(format!("{ty} {var} = {previous};\n")));
        }
        if self.depth >= self.options.max_depth {
            return Err(CodegenError::NestingTooDeep {
                limit: self.options.max_depth,
            });
        }
        self.generated.insert(id, var.to_string());

        self.depth += 1;
        let compiled = match object {
            Object::Array {
                component,
                elements,
            } => self.compile_array(component, elements, var),
            Object::Collection { class, elements } => {
                self.compile_collection(class, elements, var)
            }
            Object::Properties(properties) => Ok(compile_properties(properties, var)),
            Object::Map { class, entries } => self.compile_map(class, entries, var),
            Object::Struct(object) => self.compile_struct(object, var),
        };
        self.depth -= 1;
        compiled
    }

    fn compile_array(
        &mut self,
        component: &TypeDesc,
        elements: &[Value],
        var: &str,
    ) -> Result<Scriptlet, CodegenError> {
        let type_name = component.canonical_name();

        if component.is_scalar() {
            let literals: Option<Vec<String>> = elements
                .iter()
                .map(|element| match element {
                    Value::Null => Some("null".to_string()),
                    other => scalar_literal(other),
                })
                .collect();
            if let Some(literals) = literals {
                return Ok(Scriptlet::statement(format!(
                    "{type_name}[] {var} = new {type_name}[] {};\n",
                    brace_list(&literals)
                )));
            }
        }

        // Sized first and filled afterwards, so elements may alias the array.
        let mut out = Scriptlet::statement(format!(
            "{type_name}[] {var} = new {}[{}]{};\n",
            component.element().canonical_name(),
            elements.len(),
            "[]".repeat(component.dimensions() as usize)
        ));
        let mut stores = String::new();
        for (i, element) in elements.iter().enumerate() {
            let name = format!("{var}_element{i}_{}", self.variable_name_for(element)?);
            let element_scriptlet = self.compile(element, &name, Some(component))?;
            out.append(element_scriptlet);
            stores.push_str(&format!("{var}[{i}] = {name};\n"));
        }
        out.statements.push_str(&stores);
        Ok(out)
    }

    fn compile_collection(
        &mut self,
        class: &str,
        elements: &[Value],
        var: &str,
    ) -> Result<Scriptlet, CodegenError> {
        // The container is constructed first so elements may alias it.
        let mut out = Scriptlet::statement(format!("{class} {var} = new {class}();\n"));
        let mut adds = String::new();
        for (i, element) in elements.iter().enumerate() {
            let name = format!("{var}_element{i}_{}", self.variable_name_for(element)?);
            let element_scriptlet = self.compile(element, &name, None)?;
            out.append(element_scriptlet);
            adds.push_str(&format!("{var}.add({name});\n"));
        }
        out.statements.push_str(&adds);
        Ok(out)
    }

    fn compile_map(
        &mut self,
        class: &str,
        entries: &[(Value, Value)],
        var: &str,
    ) -> Result<Scriptlet, CodegenError> {
        let mut out = Scriptlet::statement(format!("{class} {var} = new {class}();\n"));
        let mut puts = String::new();
        for (i, (key, value)) in entries.iter().enumerate() {
            let key_expr = self.map_operand(key, &format!("{var}_key{i}"), &mut out)?;
            let value_expr = self.map_operand(value, &format!("{var}_val{i}"), &mut out)?;
            puts.push_str(&format!("{var}.put({key_expr}, {value_expr});\n"));
        }
        out.statements.push_str(&puts);
        Ok(out)
    }

    /// Null and text map operands are written inline; anything else gets a
    /// variable of its own.
    fn map_operand(
        &mut self,
        value: &Value,
        name: &str,
        out: &mut Scriptlet,
    ) -> Result<String, CodegenError> {
        match value {
            Value::Null => Ok("null".to_string()),
            Value::Text(s) => Ok(string_literal(s)),
            other => {
                let scriptlet = self.compile(other, name, None)?;
                out.append(scriptlet);
                Ok(name.to_string())
            }
        }
    }

    fn compile_struct(&mut self, object: &StructObject, var: &str) -> Result<Scriptlet, CodegenError> {
        let simple_name = TypeDesc::class(object.class.clone()).simple_name();
        let mut out = Scriptlet {
            declarations: format!("\n// ----------  Field values for {simple_name} {var}\n"),
            statements: format!("{} {var} = {}\n", object.class, self.constructor_call(object)),
        };
        for field in &object.fields {
            self.compile_field(field, var, &mut out)?;
        }
        Ok(out)
    }

    fn constructor_call(&self, object: &StructObject) -> String {
        if object.has_default_constructor {
            format!("new {}();", object.class)
        } else {
            format!(
                "{}({}.class); // WARNING: {} has no default constructor, instance built without running a constructor",
                self.options.bypass_constructor, object.class, object.class
            )
        }
    }

    fn compile_field(
        &mut self,
        field: &Field,
        var: &str,
        out: &mut Scriptlet,
    ) -> Result<(), CodegenError> {
        if !field.modifiers.is_persistent() {
            return Ok(());
        }
        let value = match &field.slot {
            FieldSlot::Value(value) => value,
            FieldSlot::Inaccessible => {
                out.statements.push_str(&format!(
                    "/* Couldn't populate value */ // {var}.{}\n",
                    field.name
                ));
                return Ok(());
            }
        };
        if !field.declared.is_primitive() && !field.serializable && !self.is_container(value)? {
            return Ok(());
        }
        if value.is_null() {
            out.statements
                .push_str(&format!("{var}.{} = null;\n", field.name));
            return Ok(());
        }

        let field_var = format!("{var}_{}", field.name);
        let field_scriptlet = self.compile(value, &field_var, None)?;
        out.append(field_scriptlet);
        out.statements
            .push_str(&format!("{var}.{} = {field_var};\n", field.name));
        Ok(())
    }

    fn is_container(&self, value: &Value) -> Result<bool, CodegenError> {
        Ok(match value {
            Value::Ref(id) => matches!(
                self.heap.get(*id)?,
                Object::Collection { .. } | Object::Map { .. } | Object::Properties(_)
            ),
            _ => false,
        })
    }
}

fn compile_properties(properties: &IndexMap<String, String>, var: &str) -> Scriptlet {
    let mut statements = format!("{PROPERTIES_CLASS} {var} = new {PROPERTIES_CLASS}();\n");
    for (key, value) in properties {
        statements.push_str(&format!(
            "{var}.setProperty({}, {});\n",
            string_literal(key),
            string_literal(value)
        ));
    }
    Scriptlet::statement(statements)
}

fn brace_list(items: &[String]) -> String {
    if items.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", items.join(", "))
    }
}
