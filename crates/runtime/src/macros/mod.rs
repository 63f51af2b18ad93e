//! Built-in macros.
//!
//! | Module | Macros |
//! |---|---|
//! | [`control`] | `if`, `switch`, `for`, `break`, `continue` |
//! | [`classes`] | `addclass`, `toggleclass`, `removeclass` |
//! | [`insert`] | `append`, `prepend`, `replace`, `remove`, `copy` |
//! | [`display`] | `include` (`display`), `nobr`, `print`, `=`, `-`, `silent` (`silently`) |
//! | [`scripting`] | `set` (`run`), `unset`, `script`, `capture` |
//! | [`persist`] | `remember`, `forget` |
//! | [`deferred`] | `done`, `goto` |

mod classes;
mod control;
mod deferred;
mod display;
mod insert;
mod persist;
mod scripting;

use quire_dom::NodeId;
use quire_registry::{MacroDef, MacroRegistry, RegistryError};

use crate::context::{MacroContext, MacroDefinition, MacroFault, MacroHandler};

fn def(handler: MacroHandler) -> MacroDefinition {
	MacroDef::new(handler)
}

/// Registers every built-in macro and alias.
pub fn register_builtins(macros: &mut MacroRegistry<MacroHandler>) -> Result<(), RegistryError> {
	macros.add("if", def(control::if_).with_children(["elseif", "else"]).skip_args())?;
	macros.add("switch", def(control::switch).with_children(["case", "default"]).skip_args_for(["switch"]))?;
	macros.add("for", def(control::for_).with_body().skip_args())?;
	macros.add(["break", "continue"], def(control::break_or_continue).skip_args())?;

	macros.add(["addclass", "toggleclass"], def(classes::add_or_toggle_class))?;
	macros.add("removeclass", def(classes::remove_class))?;

	macros.add(["append", "prepend", "replace"], def(insert::insert).with_body())?;
	macros.add("remove", def(insert::remove))?;
	macros.add("copy", def(insert::copy))?;

	macros.add("include", def(display::include))?;
	macros.add("display", "include")?;
	macros.add("nobr", def(display::nobr).with_body().skip_args())?;
	macros.add(["print", "=", "-"], def(display::print).skip_args())?;
	macros.add("silent", def(display::silent).with_body().skip_args())?;
	macros.add("silently", "silent")?;

	macros.add("set", def(scripting::set).skip_args())?;
	macros.add("run", "set")?;
	macros.add("unset", def(scripting::unset).skip_args())?;
	macros.add("script", def(scripting::script).with_body())?;
	macros.add("capture", def(scripting::capture).with_body().skip_args())?;

	macros.add("remember", def(persist::remember).skip_args())?;
	macros.add("forget", def(persist::forget).skip_args())?;

	macros.add("done", def(deferred::done).with_body().skip_args())?;
	macros.add("goto", def(deferred::goto))?;

	tracing::debug!(count = macros.len(), "macros.builtins");
	Ok(())
}

/// A registry holding only the built-in macros.
pub fn builtin_registry() -> Result<MacroRegistry<MacroHandler>, RegistryError> {
	let mut macros = MacroRegistry::new();
	register_builtins(&mut macros)?;
	Ok(macros)
}

/// Elements matching the selector in the first argument.
///
/// `Ok(None)` means the error view has already been rendered.
fn select_targets(ctx: &mut MacroContext<'_>, selector: &str) -> Result<Option<Vec<NodeId>>, MacroFault> {
	let targets = ctx.doc().select(selector)?;
	if targets.is_empty() {
		ctx.error(format!("no elements matched the selector \"{selector}\""))?;
		return Ok(None);
	}
	Ok(Some(targets))
}

#[cfg(test)]
mod tests;
