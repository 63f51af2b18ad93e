use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::{fixture, rstest};

use super::*;

type Handler = fn() -> &'static str;

fn one() -> &'static str {
	"one"
}

fn two() -> &'static str {
	"two"
}

#[fixture]
fn registry() -> MacroRegistry<Handler> {
	let mut registry = MacroRegistry::new();
	registry.add("print", MacroDef::new(one as Handler)).expect("print");
	registry
		.add("if", MacroDef::new(two as Handler).with_children(["elseif", "else"]))
		.expect("if");
	registry
}

#[rstest]
fn test_get_returns_canonical_name(registry: MacroRegistry<Handler>) {
	let resolved = registry.get("print").expect("registered");
	assert_eq!(resolved.name, "print");
	assert!(!resolved.is_alias);
	assert_eq!((resolved.def.handler)(), "one");
	assert!(registry.get("nope").is_none());
}

#[rstest]
fn test_multi_name_registration_shares_definition(mut registry: MacroRegistry<Handler>) {
	registry.add(["=", "-"], MacroDef::new(two as Handler)).expect("add");
	let a = registry.get("=").expect("=");
	let b = registry.get("-").expect("-");
	assert!(std::sync::Arc::ptr_eq(a.def, b.def));
	assert_eq!(registry.names().collect::<Vec<_>>(), vec!["print", "if", "=", "-"]);
}

#[rstest]
fn test_multi_name_registration_is_atomic(mut registry: MacroRegistry<Handler>) {
	let err = registry.add(["fresh", "print"], MacroDef::new(two as Handler)).unwrap_err();
	assert_eq!(err, RegistryError::Clobber("print".into()));
	assert!(!registry.has("fresh"));
	assert_eq!(registry.len(), 2);
}

#[rstest]
fn test_alias_resolves_to_root(mut registry: MacroRegistry<Handler>) {
	registry.add("show", "print").expect("alias");
	registry.add("display", "show").expect("alias of alias");

	let resolved = registry.get("display").expect("alias");
	assert_eq!(resolved.name, "print");
	assert!(resolved.is_alias);
	assert_eq!((resolved.def.handler)(), "one");
}

#[rstest]
fn test_alias_survives_target_removal(mut registry: MacroRegistry<Handler>) {
	registry.add("show", "print").expect("alias");
	registry.delete("print").expect("delete");
	assert!(!registry.has("print"));
	assert_eq!((registry.get("show").expect("alias").def.handler)(), "one");
}

#[rstest]
fn test_alias_of_missing_macro(mut registry: MacroRegistry<Handler>) {
	let err = registry.add("x", "missing").unwrap_err();
	assert_eq!(err.to_string(), "cannot create alias of nonexistent macro <<missing>>");
}

#[rstest]
fn test_self_referential_alias_is_rejected(mut registry: MacroRegistry<Handler>) {
	assert_eq!(registry.add("x", "x").unwrap_err(), RegistryError::MissingAliasTarget("x".into()));
	assert_eq!(registry.add("print", "print").unwrap_err(), RegistryError::Clobber("print".into()));
	assert!(!registry.has("x"));
	assert!(!registry.get("print").expect("print").is_alias);
}

#[rstest]
fn test_alias_to_name_in_same_batch_is_rejected(mut registry: MacroRegistry<Handler>) {
	assert_eq!(registry.add(["a", "b"], "a").unwrap_err(), RegistryError::MissingAliasTarget("a".into()));
	assert!(!registry.has("a") && !registry.has("b"));

	registry.add(["a", "b"], "print").expect("alias batch");
	assert_eq!(registry.add(["c", "a"], "b").unwrap_err(), RegistryError::Clobber("a".into()));
	assert!(!registry.has("c"));
	assert_eq!(registry.get("b").expect("b").name, "print");
}

#[rstest]
fn test_bodied_macro_claims_tags(registry: MacroRegistry<Handler>) {
	let tags = registry.tags();
	for tag in ["/if", "endif", "elseif", "else"] {
		assert_eq!(tags.get(tag), Some(&["if".to_owned()][..]), "{tag}");
	}
	assert!(!tags.has("/print"));
}

#[rstest]
fn test_child_tags_shared_between_parents(mut registry: MacroRegistry<Handler>) {
	registry
		.add("switch", MacroDef::new(one as Handler).with_children(["case", "else"]))
		.expect("switch");
	assert_eq!(registry.tags().get("else"), Some(&["if".to_owned(), "switch".to_owned()][..]));

	let err = registry.add("else", MacroDef::new(one as Handler)).unwrap_err();
	assert_eq!(err.to_string(), "cannot clobber child tag <<else>> of parent macros <<if>>, <<switch>>");

	registry.delete("if").expect("delete");
	assert_eq!(registry.tags().get("else"), Some(&["switch".to_owned()][..]));
	assert!(!registry.tags().has("elseif"));
}

#[rstest]
fn test_cannot_claim_existing_macro_as_tag(mut registry: MacroRegistry<Handler>) {
	let err = registry
		.add("choose", MacroDef::new(one as Handler).with_children(["print"]))
		.unwrap_err();
	assert_eq!(err, RegistryError::TagIsMacro { tag: "print".into() });
	assert!(!registry.has("choose"));
	assert!(!registry.tags().has("/choose"));
}

#[rstest]
fn test_delete_semantics(mut registry: MacroRegistry<Handler>) {
	registry.delete("never-registered").expect("no-op");

	let err = registry.delete("endif").unwrap_err();
	assert_eq!(err.to_string(), "cannot remove child tag <<endif>> of parent macro <<if>>");

	registry.delete("if").expect("delete");
	assert!(registry.tags().get("/if").is_none());
	registry.add("endif", MacroDef::new(one as Handler)).expect("tag freed");
}

#[rstest]
#[case("")]
#[case("has space")]
#[case("a>b")]
#[case("/close")]
fn test_invalid_names(#[case] name: &str) {
	let mut registry = MacroRegistry::<Handler>::new();
	assert_eq!(
		registry.add(name, MacroDef::new(one as Handler)).unwrap_err(),
		RegistryError::InvalidName(name.to_owned())
	);
}

#[test]
fn test_empty_name_list() {
	let mut registry = MacroRegistry::<Handler>::new();
	let names: Vec<String> = Vec::new();
	assert_eq!(registry.add(names, MacroDef::new(one as Handler)).unwrap_err(), RegistryError::NoNames);
	assert!(registry.is_empty());
}

#[test]
fn test_user_data_and_skip_args() {
	let def = MacroDef::new(one as Handler)
		.with_body()
		.skip_args_for(["/x"])
		.with_user_data(41_u32);
	assert_eq!(def.user_data::<u32>(), Some(&41));
	assert_eq!(def.user_data::<String>(), None);
	assert!(def.skip_args.applies_to("/x"));
	assert!(!def.skip_args.applies_to("x"));
	assert!(MacroDef::new(one as Handler).skip_args().skip_args.applies_to("anything"));
}

proptest! {
	#[test]
	fn prop_add_then_delete_restores_tags(children in prop::collection::btree_set("[a-z]{3,6}", 0..4)) {
		let mut registry = MacroRegistry::<Handler>::new();
		let children: Vec<String> = children.into_iter().collect();
		registry.add("Outer", MacroDef::new(one as Handler).with_children(children.clone())).expect("add");
		for child in &children {
			prop_assert!(registry.tags().has(child));
		}
		registry.delete("Outer").expect("delete");
		prop_assert!(registry.is_empty());
		for child in &children {
			prop_assert!(!registry.tags().has(child));
		}
	}
}
