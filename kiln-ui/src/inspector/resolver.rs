// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Editor registry and resolution of an editor for a set of values.

use crate::{
    core::{
        fxhash::FxHashMap,
        info,
        reflect::{builtin, TypeDatabase, TypeKind, TypeName},
    },
    inspector::{
        editor::CustomEditor,
        editors::{self, ArrayEditor, DictionaryEditor, EnumEditor, GenericEditor, ObjectRefEditor},
        values::ValueContainer,
    },
};
use std::{
    fmt::{Debug, Formatter},
    rc::Rc,
};

pub type EditorFactory = Rc<dyn Fn() -> Box<dyn CustomEditor>>;

/// Named editor definition. Every editor instance is created by the factory.
#[derive(Clone)]
pub struct EditorDescriptor {
    name: Rc<str>,
    factory: EditorFactory,
}

impl Debug for EditorDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "EditorDescriptor({})", self.name)
    }
}

impl PartialEq for EditorDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl EditorDescriptor {
    pub fn new<F>(name: &str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn CustomEditor> + 'static,
    {
        Self {
            name: Rc::from(name),
            factory: Rc::new(factory),
        }
    }

    /// Descriptor of an editor that is created with [`Default`].
    pub fn of<T: CustomEditor + Default>(name: &str) -> Self {
        Self::new(name, || Box::new(T::default()) as Box<dyn CustomEditor>)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_rc(&self) -> Rc<str> {
        self.name.clone()
    }

    pub fn create(&self) -> Box<dyn CustomEditor> {
        (self.factory)()
    }
}

/// A set of editor registrations that is loaded and unloaded at once (for example, editors of
/// a plugin).
#[derive(Clone, Debug)]
pub struct EditorModule {
    name: String,
    defaults: Vec<(TypeName, EditorDescriptor)>,
    overrides: Vec<(TypeName, EditorDescriptor)>,
    generics: Vec<(TypeName, EditorDescriptor)>,
    aliases: Vec<(String, EditorDescriptor)>,
}

impl EditorModule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            defaults: Default::default(),
            overrides: Default::default(),
            generics: Default::default(),
            aliases: Default::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Editor used for the type unless some module overrides it.
    pub fn with_default(mut self, target: impl Into<TypeName>, editor: EditorDescriptor) -> Self {
        self.defaults.push((target.into(), editor));
        self
    }

    /// Editor that replaces the default editor of the type.
    pub fn with_override(mut self, target: impl Into<TypeName>, editor: EditorDescriptor) -> Self {
        self.overrides.push((target.into(), editor));
        self
    }

    /// Editor for every closed type of an open generic type.
    pub fn with_generic(
        mut self,
        definition: impl Into<TypeName>,
        editor: EditorDescriptor,
    ) -> Self {
        self.generics.push((definition.into(), editor));
        self
    }

    /// Makes the editor available for custom editor attributes under the name.
    pub fn with_alias(mut self, alias: &str, editor: EditorDescriptor) -> Self {
        self.aliases.push((alias.to_owned(), editor));
        self
    }
}

/// Maps types to editors. Modules loaded later win over earlier ones, overrides always win over
/// defaults.
#[derive(Default)]
pub struct EditorRegistry {
    modules: Vec<EditorModule>,
    defaults: FxHashMap<TypeName, EditorDescriptor>,
    overrides: FxHashMap<TypeName, EditorDescriptor>,
    generics: FxHashMap<TypeName, EditorDescriptor>,
    aliases: FxHashMap<String, EditorDescriptor>,
}

impl EditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the builtin editors loaded.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.load_module(editors::builtin_module());
        registry
    }

    /// Loads the module, replacing a loaded module with the same name.
    pub fn load_module(&mut self, module: EditorModule) {
        self.modules.retain(|m| m.name != module.name);
        info!("Editor module {} was loaded.", module.name);
        self.modules.push(module);
        self.reindex();
    }

    /// Removes every registration of the module. Returns `false` if the module was not loaded.
    pub fn unload_module(&mut self, name: &str) -> bool {
        let count = self.modules.len();
        self.modules.retain(|m| m.name != name);
        if self.modules.len() == count {
            return false;
        }
        info!("Editor module {name} was unloaded.");
        self.reindex();
        true
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m.name == name)
    }

    fn reindex(&mut self) {
        self.defaults.clear();
        self.overrides.clear();
        self.generics.clear();
        self.aliases.clear();
        for module in self.modules.iter() {
            for (target, editor) in module.defaults.iter() {
                self.defaults.insert(target.clone(), editor.clone());
            }
            for (target, editor) in module.overrides.iter() {
                self.overrides.insert(target.clone(), editor.clone());
            }
            for (target, editor) in module.generics.iter() {
                self.generics.insert(target.clone(), editor.clone());
            }
            for (alias, editor) in module.aliases.iter() {
                self.aliases.insert(alias.clone(), editor.clone());
            }
        }
    }

    pub fn lookup(&self, target: &TypeName) -> Option<&EditorDescriptor> {
        self.overrides
            .get(target)
            .or_else(|| self.defaults.get(target))
    }

    pub fn generic(&self, definition: &TypeName) -> Option<&EditorDescriptor> {
        self.generics.get(definition)
    }

    pub fn alias(&self, alias: &str) -> Option<EditorDescriptor> {
        self.aliases.get(alias).cloned()
    }
}

/// Everything a resolution rule may look at.
pub struct ResolveContext<'a> {
    /// Declared type of the values.
    pub value_type: TypeName,
    pub values: &'a ValueContainer,
    pub types: &'a TypeDatabase,
    pub registry: &'a EditorRegistry,
    pub override_editor: Option<&'a EditorDescriptor>,
    pub allow_reference_picker: bool,
}

/// A rule either picks an editor or passes the values to the next rule.
pub type ResolverRule = fn(&ResolveContext, &EditorResolver) -> Option<EditorDescriptor>;

/// Ordered list of resolution rules. The first rule that returns an editor wins, values nobody
/// claims are edited member-wise by [`GenericEditor`].
pub struct EditorResolver {
    rules: Vec<(&'static str, ResolverRule)>,
}

impl Default for EditorResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorResolver {
    pub fn new() -> Self {
        Self {
            rules: vec![
                ("override", override_rule),
                ("runtime type", runtime_type_rule),
                ("array", array_rule),
                ("reference picker", reference_picker_rule),
                ("registry", registry_rule),
                ("type attribute", type_attribute_rule),
                ("type kind", type_kind_rule),
            ],
        }
    }

    /// Inserts a custom rule before the rule at the index.
    pub fn insert_rule(&mut self, index: usize, name: &'static str, rule: ResolverRule) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, (name, rule));
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|(name, _)| *name).collect()
    }

    pub fn resolve(&self, ctx: &ResolveContext) -> EditorDescriptor {
        self.rules
            .iter()
            .find_map(|(_, rule)| rule(ctx, self))
            .unwrap_or_else(GenericEditor::descriptor)
    }
}

fn override_rule(ctx: &ResolveContext, _: &EditorResolver) -> Option<EditorDescriptor> {
    ctx.override_editor.cloned()
}

// Values stored in members of the universal type are resolved by their actual type.
fn runtime_type_rule(ctx: &ResolveContext, resolver: &EditorResolver) -> Option<EditorDescriptor> {
    if !ctx.value_type.is_any() {
        return None;
    }
    let runtime_type = ctx.values.shared_runtime_type().filter(|t| !t.is_any())?;
    Some(resolver.resolve(&ResolveContext {
        value_type: runtime_type,
        override_editor: None,
        ..*ctx
    }))
}

fn array_rule(ctx: &ResolveContext, _: &EditorResolver) -> Option<EditorDescriptor> {
    let info = ctx.types.get(ctx.value_type.as_str())?;
    matches!(info.kind, TypeKind::Array { .. }).then(ArrayEditor::descriptor)
}

fn reference_picker_rule(ctx: &ResolveContext, _: &EditorResolver) -> Option<EditorDescriptor> {
    if !ctx.allow_reference_picker {
        return None;
    }
    if ctx.types.is_asset(&ctx.value_type) {
        Some(ObjectRefEditor::asset_descriptor())
    } else if ctx.types.is_engine_object(&ctx.value_type) {
        Some(ObjectRefEditor::descriptor())
    } else {
        None
    }
}

fn registry_rule(ctx: &ResolveContext, _: &EditorResolver) -> Option<EditorDescriptor> {
    for target in ctx.types.base_chain(&ctx.value_type) {
        // Editors of the engine object base are pickers, skip them when pickers are disabled.
        if !ctx.allow_reference_picker && target.as_str() == builtin::ENGINE_OBJECT {
            break;
        }
        if let Some(editor) = ctx.registry.lookup(&target) {
            return Some(editor.clone());
        }
    }
    None
}

fn type_attribute_rule(ctx: &ResolveContext, _: &EditorResolver) -> Option<EditorDescriptor> {
    ctx.types
        .base_chain(&ctx.value_type)
        .iter()
        .filter_map(|t| ctx.types.get(t.as_str()))
        .find_map(|info| info.custom_editor().map(str::to_owned))
        .and_then(|alias| ctx.registry.alias(&alias))
}

fn type_kind_rule(ctx: &ResolveContext, _: &EditorResolver) -> Option<EditorDescriptor> {
    let info = ctx.types.get(ctx.value_type.as_str())?;
    match &info.kind {
        TypeKind::Enum { .. } => Some(EnumEditor::descriptor()),
        TypeKind::Dictionary { .. } => Some(DictionaryEditor::descriptor()),
        TypeKind::Generic { definition, .. } => ctx
            .registry
            .generic(definition)
            .or_else(|| ctx.registry.lookup(definition))
            .cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::{EditorModule, EditorRegistry, EditorResolver, ResolveContext};
    use crate::{
        core::reflect::{builtin, Attribute, Object, TypeDatabase, TypeInfo, TypeName, Value},
        inspector::{
            editors::{GenericEditor, IntegerEditor, StringEditor},
            resolver::EditorDescriptor,
            values::ValueContainer,
        },
    };

    fn resolve(
        types: &TypeDatabase,
        registry: &EditorRegistry,
        values: Vec<Value>,
        value_type: &str,
        allow_reference_picker: bool,
    ) -> String {
        let values = ValueContainer::new_root(values, TypeName::new(value_type));
        let ctx = ResolveContext {
            value_type: values.value_type().clone(),
            values: &values,
            types,
            registry,
            override_editor: None,
            allow_reference_picker,
        };
        EditorResolver::new().resolve(&ctx).name().to_owned()
    }

    fn database() -> TypeDatabase {
        let mut types = TypeDatabase::new();
        types.register(TypeInfo::enumeration("Mode", &["Fast", "Slow"]));
        types.register(TypeInfo::array("int[]", builtin::INT));
        types.register(TypeInfo::dictionary("Table", builtin::STRING, builtin::INT));
        types.register(TypeInfo::class("Texture").with_base(builtin::ASSET));
        types.register(TypeInfo::class("Light").with_base(builtin::ACTOR));
        types.register(
            TypeInfo::class("Tinted").with_attribute(Attribute::CustomEditor("Text".to_owned())),
        );
        types.register(TypeInfo::generic(
            "List<int>",
            "List",
            vec![TypeName::new(builtin::INT)],
        ));
        types
    }

    #[test]
    fn rules_run_in_order() {
        let types = database();
        let registry = EditorRegistry::with_builtins();
        let cases = [
            (vec![Value::Int(1)], builtin::INT, "IntegerEditor"),
            (vec![Value::Int(1)], builtin::ANY, "IntegerEditor"),
            (vec![Value::Array(vec![])], "int[]", "ArrayEditor"),
            (vec![Value::Dictionary(vec![])], "Table", "DictionaryEditor"),
            (vec![Value::Null], "Mode", "EnumEditor"),
            (vec![Value::Null], "Texture", "AssetRefEditor"),
            (vec![Value::Null], "Light", "ObjectRefEditor"),
            (vec![Value::Null], "Unknown", "GenericEditor"),
        ];
        for (values, value_type, expected) in cases {
            assert_eq!(
                resolve(&types, &registry, values, value_type, true),
                expected,
                "{value_type}"
            );
        }
    }

    #[test]
    fn reference_picker_can_be_disabled() {
        let types = database();
        let registry = EditorRegistry::with_builtins();
        let light = Object::new("Light").into();
        assert_eq!(
            resolve(&types, &registry, vec![light], "Light", false),
            "GenericEditor"
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let types = database();
        let registry = EditorRegistry::with_builtins();
        let first = resolve(&types, &registry, vec![Value::Null], "Mode", true);
        for _ in 0..10 {
            assert_eq!(resolve(&types, &registry, vec![Value::Null], "Mode", true), first);
        }
    }

    #[test]
    fn override_beats_default() {
        let types = database();
        let mut registry = EditorRegistry::with_builtins();
        registry.load_module(
            EditorModule::new("plugin")
                .with_override(builtin::INT, StringEditor::descriptor())
                .with_default(builtin::INT, GenericEditor::descriptor()),
        );
        assert_eq!(
            resolve(&types, &registry, vec![Value::Int(1)], builtin::INT, true),
            "StringEditor"
        );

        assert!(registry.unload_module("plugin"));
        assert!(!registry.unload_module("plugin"));
        assert_eq!(
            resolve(&types, &registry, vec![Value::Int(1)], builtin::INT, true),
            "IntegerEditor"
        );
    }

    #[test]
    fn generic_and_attribute_rules() {
        let types = database();
        let mut registry = EditorRegistry::with_builtins();
        registry.load_module(
            EditorModule::new("lists")
                .with_generic("List", IntegerEditor::descriptor())
                .with_alias("Text", StringEditor::descriptor()),
        );
        assert_eq!(
            resolve(&types, &registry, vec![Value::Null], "List<int>", true),
            "IntegerEditor"
        );
        assert_eq!(
            resolve(&types, &registry, vec![Value::Null], "Tinted", true),
            "StringEditor"
        );
    }

    #[test]
    fn custom_rules_can_be_inserted() {
        let types = database();
        let registry = EditorRegistry::with_builtins();
        let mut resolver = EditorResolver::new();
        resolver.insert_rule(0, "everything is text", |_, _| {
            Some(EditorDescriptor::of::<crate::inspector::editors::StringEditor>("Everything"))
        });
        let values = ValueContainer::new_root(vec![Value::Int(1)], TypeName::new(builtin::INT));
        let ctx = ResolveContext {
            value_type: values.value_type().clone(),
            values: &values,
            types: &types,
            registry: &registry,
            override_editor: None,
            allow_reference_picker: true,
        };
        assert_eq!(resolver.resolve(&ctx).name(), "Everything");
        assert_eq!(resolver.rule_names()[0], "everything is text");
    }
}
