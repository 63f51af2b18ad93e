use pretty_assertions::assert_eq;
use quire_dom::NodeId;
use quire_primitives::Value;
use quire_registry::MacroDef;
use quire_script::Scope;
use quire_storage::{SimpleStore, Store, WebStorageAdapter};
use rstest::rstest;
use serde_json::json;

use crate::config::Config;
use crate::context::{MacroContext, MacroFault, MacroHandler, MacroOutcome, MacroResult};
use crate::error_view::error_texts;
use crate::runtime::{REMEMBER_KEY, Runtime};
use crate::story::{Passage, Story};

/// A runtime with an attached `<div>` to render into.
struct Stage {
	rt: Runtime,
	out: NodeId,
}

impl Stage {
	fn new() -> Self {
		Self::with_config(Config::default())
	}

	fn with_config(config: Config) -> Self {
		let story = Story::new()
			.with_passage(Passage::new("Inc", "hi"))
			.with_passage(Passage::new("Lines", "a\nb").with_tags(["nobr"]))
			.with_passage(Passage::new("Loop", "<<include \"Loop\">>"))
			.with_passage(Passage::new("B", "bee"));
		let mut rt = Runtime::new(config, story).expect("runtime");
		let out = rt.doc_mut().create_element("div");
		let root = rt.doc().root();
		rt.doc_mut().append(root, out);
		Self { rt, out }
	}

	fn render(&mut self, text: &str) -> String {
		self.rt.wiki(self.out, text);
		self.html()
	}

	fn html(&self) -> String {
		self.rt.doc().inner_html(self.out)
	}

	fn errors(&self) -> Vec<String> {
		error_texts(self.rt.doc(), self.out)
	}

	fn var(&self, name: &str) -> Value {
		self.rt.state().variable(name)
	}
}

fn echo_blocks(ctx: &mut MacroContext<'_>) -> MacroResult {
	let summary: Vec<String> = ctx
		.payload()
		.iter()
		.map(|block| format!("{}({})[{}]", block.name, block.args.raw(), block.contents))
		.collect();
	let output = ctx.output();
	let text = summary.join(" ");
	ctx.doc_mut().append_text(output, &text);
	Ok(MacroOutcome::Applied)
}

fn always_faults(_ctx: &mut MacroContext<'_>) -> MacroResult {
	Err(MacroFault::new("boom"))
}

#[rstest]
#[case("<<print 2 + 2>>", "4")]
#[case("<<= \"<b>x</b>\">>", "<b>x</b>")]
#[case("<<- \"<b>\" + \"</b>\">>", "&lt;b&gt;&lt;/b&gt;")]
#[case("<<print null>>", "")]
#[case("<<print undefined>>", "[undefined]")]
#[case("<<set $n to 3>><<print $n * 2>>", "6")]
fn test_print(#[case] source: &str, #[case] expected: &str) {
	assert_eq!(Stage::new().render(source), expected);
}

#[rstest]
#[case("<<print>>", "Error: <<print>>: no expression specified")]
#[case("<<nope>>", "Error: macro <<nope>> does not exist")]
#[case("<<set>>", "Error: <<set>>: no expression specified")]
#[case("<<unset>>", "Error: <<unset>>: no story/temporary variable list specified")]
#[case("<<capture>><</capture>>", "Error: <<capture>>: no story/temporary variable list specified")]
#[case("<<include>>", "Error: <<include>>: no passage specified")]
#[case("<<include \"Nope\">>", "Error: <<include>>: passage \"Nope\" does not exist")]
#[case("<<goto>>", "Error: <<goto>>: no passage specified")]
#[case("<<addclass>>", "Error: <<addclass>>: no selector or class names specified")]
#[case("<<toggleclass \"#t\">>", "Error: <<toggleclass>>: no class names specified")]
#[case("<<addclass \"#none\" \"x\">>", "Error: <<addclass>>: no elements matched the selector \"#none\"")]
#[case("<<removeclass>>", "Error: <<removeclass>>: no selector specified")]
#[case("<<remove \"#none\">>", "Error: <<remove>>: no elements matched the selector \"#none\"")]
#[case("<<forget>>", "Error: <<forget>>: no story variable list specified")]
#[case("<<script lua>><</script>>", "Error: <<script>>: unknown language \"lua\"")]
#[case("<<nobr>>abc", "Error: cannot find a closing tag for macro <<nobr>>")]
#[case(
	"<<addclass \"[\" \"x\">>",
	"Error: cannot execute macro <<addclass>>: syntax error, unrecognized expression: ["
)]
#[case(
	"<<nobr>>x<</nobr y>>",
	"Error: cannot execute macro <<nobr>>: malformed closing tag: \"<</nobr y>>\""
)]
fn test_error_messages(#[case] source: &str, #[case] expected: &str) {
	let mut stage = Stage::new();
	stage.render(source);
	assert_eq!(stage.errors(), vec![expected]);
}

#[test]
fn test_rendering_resumes_after_errors() {
	let mut stage = Stage::new();
	let html = stage.render("<<nobr>>abc");
	assert!(html.ends_with("</div>abc"), "{html}");

	let mut stage = Stage::new();
	let html = stage.render("<<nobr>>x<</nobr y>>!");
	assert!(html.ends_with("</div> y&gt;&gt;!"), "{html}");
}

#[test]
fn test_error_source_is_the_invocation() {
	let mut stage = Stage::new();
	stage.render("<<nobr>>abc");
	let code = stage.rt.doc().select(".error-source code").expect("selector");
	assert_eq!(stage.rt.doc().text_content(code[0]), "<<nobr>>\u{2026}");
}

#[test]
fn test_payload_blocks_and_child_tags() {
	let mut stage = Stage::new();
	let handler: MacroHandler = echo_blocks;
	stage
		.rt
		.registry_mut()
		.add("outer", MacroDef::new(handler).with_children(["inner"]).skip_args())
		.expect("register");

	assert_eq!(stage.render("<<outer a>>x<<inner b>>y<</outer>>"), "outer(a)[x] inner(b)[y]");

	let mut stage = Stage::new();
	stage
		.rt
		.registry_mut()
		.add("outer", MacroDef::new(handler).with_children(["inner"]))
		.expect("register");
	stage.render("<<inner>>");
	assert_eq!(
		stage.errors(),
		vec!["Error: child tag <<inner>> was found outside of a call to its parent macro <<outer>>"]
	);
}

#[test]
fn test_handler_faults_are_rendered() {
	let mut stage = Stage::new();
	let handler: MacroHandler = always_faults;
	stage.rt.registry_mut().add("boom", MacroDef::new(handler)).expect("register");
	let summary = stage.rt.wiki(stage.out, "a<<boom>>b");
	assert_eq!(summary.macros, 1);
	assert_eq!(summary.failed, 1);
	assert_eq!(stage.errors(), vec!["Error: cannot execute macro <<boom>>: boom"]);
}

#[test]
fn test_nesting_depth_is_capped() {
	let mut stage = Stage::with_config(Config {
		max_nesting: 3,
		..Config::default()
	});
	stage.render("<<include \"Loop\">>");
	assert_eq!(
		stage.errors(),
		vec!["Error: cannot execute macro <<include>>: maximum nesting depth of 3 exceeded"]
	);
}

#[test]
fn test_addclass_is_idempotent() {
	let mut stage = Stage::new();
	let html = stage.render("<span id=\"t\"></span><<addclass \"#t\" \" a b \">><<addclass \"#t\" \"a\">>");
	assert_eq!(html, "<span id=\"t\" class=\"a b\"></span>");
}

#[rstest]
#[case("<span id=\"t\" class=\"a\"></span><<toggleclass \"#t\" \"a b\">>", "<span id=\"t\" class=\"b\"></span>")]
#[case("<span id=\"t\" class=\"a b c\"></span><<removeclass \"#t\" \"b\">>", "<span id=\"t\" class=\"a c\"></span>")]
#[case("<span id=\"t\" class=\"a b\"></span><<removeclass \"#t\">>", "<span id=\"t\"></span>")]
fn test_class_macros(#[case] source: &str, #[case] expected: &str) {
	assert_eq!(Stage::new().render(source), expected);
}

#[rstest]
#[case(
	"<p class=\"t\">a</p><p class=\"t\">b</p><<append \".t\">>!<</append>>",
	"<p class=\"t\">a!</p><p class=\"t\">b!</p>"
)]
#[case("<p id=\"t\">x</p><<prepend \"#t\">>''<b>1</b><</prepend>>", "<p id=\"t\">''<b>1</b>x</p>")]
#[case("<p id=\"t\">x</p><<replace \"#t\">>y<</replace>>", "<p id=\"t\">y</p>")]
#[case("<p id=\"t\">x</p><<replace \"#t\">><</replace>>", "<p id=\"t\"></p>")]
#[case("<p id=\"t\">x</p><<append \"#t\">><</append>>", "<p id=\"t\">x</p>")]
#[case("<p id=\"t\">x</p>y<<remove \"#t\">>", "y")]
#[case("<p id=\"t\">a<b>b</b></p><<copy \"#t\">>", "<p id=\"t\">a<b>b</b></p>a<b>b</b>")]
fn test_insertion_macros(#[case] source: &str, #[case] expected: &str) {
	assert_eq!(Stage::new().render(source), expected);
}

#[test]
fn test_transition_class_is_removed_after_delay() {
	let mut stage = Stage::new();
	let html = stage.render("<p id=\"t\"></p><<append \"#t\" t8n>>y<</append>>");
	assert_eq!(html, "<p id=\"t\"><span class=\"macro-append-insert macro-append-in\">y</span></p>");

	stage.rt.advance(10);
	assert!(stage.html().contains("macro-append-in\""));
	stage.rt.advance(30);
	assert_eq!(stage.html(), "<p id=\"t\"><span class=\"macro-append-insert\">y</span></p>");
}

#[rstest]
#[case("<<include \"Inc\">>", "hi")]
#[case("<<include [[Inc]]>>", "hi")]
#[case("<<display \"Inc\">>", "hi")]
#[case("<<include \"Lines\">>", "a b")]
#[case("<<include \"Inc\" \"div\">>", "<div class=\"passage-inc macro-include\" data-passage=\"Inc\">hi</div>")]
#[case("<<nobr>>\na\n\nb\n<</nobr>>", "a b")]
fn test_include_and_nobr(#[case] source: &str, #[case] expected: &str) {
	assert_eq!(Stage::new().render(source), expected);
}

#[test]
fn test_silent_hides_output_but_keeps_effects() {
	let mut stage = Stage::new();
	assert_eq!(stage.render("<<silent>>\n<<set $x to 5>>visible\n<</silent>>"), "");
	assert_eq!(stage.var("$x"), Value::Number(5.0));
	assert_eq!(stage.render("<<silently>>also hidden<</silently>>"), "");
}

#[test]
fn test_silent_aggregates_errors() {
	let mut stage = Stage::new();
	stage.render("<<silent>><<nope>><<print>><</silent>>");
	assert_eq!(
		stage.errors(),
		vec![
			"Error: <<silent>>: errors within contents (Error: macro <<nope>> does not exist; Error: <<print>>: no expression specified)"
		]
	);
}

#[test]
fn test_set_run_and_unset() {
	let mut stage = Stage::new();
	stage.render("<<set $a to 1; _b to 2>><<run $a to $a + 1>>");
	assert_eq!(stage.var("$a"), Value::Number(2.0));
	assert_eq!(stage.var("_b"), Value::Number(2.0));

	stage.render("<<unset $a, _b>>");
	assert_eq!(stage.var("$a"), Value::Undefined);
	assert_eq!(stage.var("_b"), Value::Undefined);
	assert!(stage.errors().is_empty());
}

#[test]
fn test_bad_evaluation() {
	let mut stage = Stage::new();
	stage.render("<<set $a to>>");
	let errors = stage.errors();
	assert_eq!(errors.len(), 1);
	assert!(errors[0].starts_with("Error: <<set>>: bad evaluation: "), "{errors:?}");
}

#[test]
fn test_script_prints_and_desugars() {
	let mut stage = Stage::new();
	assert_eq!(stage.render("<<script>>print(\"<b>x</b>\")<</script>>"), "<b>x</b>");

	let mut stage = Stage::new();
	stage.render("<<script twinescript>>$s to 2<</script>>");
	assert_eq!(stage.var("$s"), Value::Number(2.0));
	assert_eq!(stage.html(), "");
}

#[test]
fn test_capture_restores_variables() {
	let mut stage = Stage::new();
	let html = stage.render("<<set _i to 1>><<capture _i>><<set _i to 2>><<print _i>><</capture>><<print _i>>");
	assert_eq!(html, "21");
}

#[test]
fn test_deferred_work_sees_captured_values() {
	let mut stage = Stage::new();
	stage.render("<<set $x to 1>><<capture $x>><<done>><<set $seen to $x>><</done>><</capture>><<set $x to 9>>");
	assert_eq!(stage.var("$seen"), Value::Undefined);

	stage.rt.run_until_idle();
	assert_eq!(stage.var("$seen"), Value::Number(1.0));
	assert_eq!(stage.var("$x"), Value::Number(9.0));
}

#[test]
fn test_capture_accepts_both_scopes() {
	let mut stage = Stage::new();
	stage.render("<<capture $ok, _fine>><</capture>>");
	assert!(stage.errors().is_empty());
}

fn memory_store() -> Box<dyn Store> {
	SimpleStore::new()
		.with_adapter(WebStorageAdapter::in_memory())
		.create("test", true)
		.expect("store")
}

#[test]
fn test_remember_and_forget() {
	let mut stage = Stage::new();
	stage.rt.attach_storage(memory_store());

	stage.render("<<remember $gold to 5>><<remember $name to \"Ann\">>");
	assert_eq!(stage.var("$gold"), Value::Number(5.0));
	let stored = stage.rt.store().and_then(|s| s.get(REMEMBER_KEY));
	assert_eq!(stored, Some(json!({"gold": 5, "name": "Ann"})));

	stage.render("<<forget $gold>>");
	assert_eq!(stage.var("$gold"), Value::Undefined);
	assert_eq!(stage.rt.store().and_then(|s| s.get(REMEMBER_KEY)), Some(json!({"name": "Ann"})));

	stage.render("<<forget $name>>");
	assert!(!stage.rt.store().is_some_and(|s| s.has(REMEMBER_KEY)));
	assert!(stage.errors().is_empty());
}

#[test]
fn test_attaching_storage_restores_remembered_variables() {
	let mut store = memory_store();
	store.set(REMEMBER_KEY, &json!({"gold": 7})).expect("set");

	let mut stage = Stage::new();
	assert_eq!(stage.rt.attach_storage(store), 1);
	assert_eq!(stage.rt.state().get(Scope::Story, "gold"), Some(&Value::Number(7.0)));
}

#[test]
fn test_remember_without_storage() {
	let mut stage = Stage::new();
	stage.render("<<remember $gold to 5>>");
	assert_eq!(stage.errors(), vec!["Error: <<remember>>: no storage is attached"]);
}

#[test]
fn test_done_runs_after_delay() {
	let mut stage = Stage::new();
	let html = stage.render("<span id=\"t\"></span><<done>><<addclass \"#t\" \"ready\">><</done>>");
	assert_eq!(html, "<span id=\"t\"></span>");
	assert_eq!(stage.rt.tasks().len(), 1);

	stage.rt.advance(40);
	assert_eq!(stage.html(), "<span id=\"t\" class=\"ready\"></span>");
	assert!(stage.rt.take_deferred_errors().is_empty());
}

#[test]
fn test_done_with_empty_body_schedules_nothing() {
	let mut stage = Stage::new();
	stage.render("<<done>>  <</done>>");
	assert!(stage.rt.tasks().is_empty());
}

#[test]
fn test_done_reports_errors() {
	let mut stage = Stage::new();
	stage.render("<<done>><<nope>><</done>>");
	stage.rt.run_until_idle();
	assert_eq!(stage.rt.take_deferred_errors(), vec!["macro <<nope>> does not exist"]);
	assert!(stage.rt.take_deferred_errors().is_empty());
}

#[test]
fn test_goto_plays_after_delay() {
	let mut stage = Stage::new();
	stage.render("<<goto \"B\">>");
	assert!(stage.rt.history().is_empty());

	stage.rt.advance(40);
	assert_eq!(stage.rt.history(), ["B"]);
	assert!(stage.rt.html().contains("bee"));
}

#[test]
fn test_goto_missing_passage_schedules_nothing() {
	let mut stage = Stage::new();
	stage.render("<<goto \"Chapter 2\">>");
	assert_eq!(stage.errors(), vec!["Error: <<goto>>: passage \"Chapter 2\" does not exist"]);
	assert!(stage.rt.tasks().is_empty());
}

#[test]
fn test_debug_views_wrap_output() {
	let mut stage = Stage::with_config(Config {
		debug: true,
		..Config::default()
	});
	let html = stage.render("<<set $x to 1>><<print 7>>");
	assert_eq!(
		html,
		concat!(
			"<span title=\"<<set $x to 1>>\" aria-label=\"<<set $x to 1>>\" data-type=\"macro\" data-name=\"set\" class=\"debug hidden\"></span>",
			"<wbr class=\"debug hidden\">",
			"<span title=\"<<print 7>>\" aria-label=\"<<print 7>>\" data-type=\"macro\" data-name=\"print\" class=\"debug\">7</span>",
			"<wbr class=\"debug hidden\">",
		)
	);
}

#[test]
fn test_errors_bypass_debug_views() {
	let mut stage = Stage::with_config(Config {
		debug: true,
		..Config::default()
	});
	stage.render("<<print>>");
	let root = stage.out;
	let children = stage.rt.doc().children(root).to_vec();
	assert_eq!(children.len(), 1);
	assert!(stage.rt.doc().has_class(children[0], "error-view"));
}

#[test]
fn test_silent_in_debug_mode_keeps_output_hidden() {
	let mut stage = Stage::with_config(Config {
		debug: true,
		..Config::default()
	});
	let html = stage.render("<<silent>>kept<</silent>>");
	assert!(html.contains("class=\"debug nonvoid hidden block\">kept</span>"), "{html}");
}

#[rstest]
#[case("<<set $x to 2>><<if $x is 1>>one<<elseif $x is 2>>two<<else>>other<</if>>", "two")]
#[case("<<if $missing>>a<<else>>b<</if>>", "b")]
#[case("<<if false>>never<</if>>", "")]
#[case("<<if true>><<if false>>x<<else>>y<</if>><<else>>z<</if>>", "y")]
#[case("<<if 0>>a<<elseif \"\">>b<<elseif [0]>>c<</if>>", "c")]
fn test_if_renders_first_passing_clause(#[case] source: &str, #[case] expected: &str) {
	let mut stage = Stage::new();
	assert_eq!(stage.render(source), expected);
	assert!(stage.errors().is_empty());
}

#[rstest]
#[case("<<if>>x<</if>>", "Error: <<if>>: no conditional expression specified for <<if>> clause")]
#[case(
	"<<if true>>a<<elseif>>b<</if>>",
	"Error: <<if>>: no conditional expression specified for <<elseif>> clause (#1)"
)]
#[case(
	"<<if true>>a<<else if false>>b<</if>>",
	"Error: <<if>>: whitespace is not allowed between the \"else\" and \"if\" in <<elseif>> clause (#1)"
)]
#[case(
	"<<if true>>a<<else 1>>b<</if>>",
	"Error: <<if>>: <<else>> does not accept a conditional expression (perhaps you meant to use <<elseif>>), invalid: 1"
)]
#[case("<<if true>>a<<else>>b<<else>>c<</if>>", "Error: <<if>>: <<else>> must be the final clause")]
#[case(
	"<<if $x to 1>>a<</if>>",
	"Error: <<if>>: assignment operator found within <<if>> clause (perhaps you meant to use an equality operator: ==, ===, eq, is), invalid: $x to 1"
)]
#[case("<<switch>><<case 1>>a<</switch>>", "Error: <<switch>>: no expression specified")]
#[case("<<switch 1>>a<</switch>>", "Error: <<switch>>: no cases specified")]
#[case(
	"<<switch 1>><<case 1>>a<<default 2>>b<</switch>>",
	"Error: <<switch>>: <<default>> does not accept values, invalid: 2"
)]
#[case("<<switch 1>><<default>>b<<case 1>>a<</switch>>", "Error: <<switch>>: <<default>> must be the final case")]
#[case("<<switch 1>><<case 1>>a<<case>>b<</switch>>", "Error: <<switch>>: no value(s) specified for <<case>> (#2)")]
#[case("<<case 1>>", "Error: child tag <<case>> was found outside of a call to its parent macro <<switch>>")]
#[case("<<break>>", "Error: <<break>>: must only be used in conjunction with its parent macro <<for>>")]
#[case(
	"<<if true>><<continue>><</if>>",
	"Error: <<continue>>: must only be used in conjunction with its parent macro <<for>>"
)]
#[case(
	"<<for _k in $list>>x<</for>>",
	"Error: <<for>>: invalid syntax, for\u{2026}in is not supported; see: for\u{2026}range"
)]
#[case(
	"<<for _k of $list>>x<</for>>",
	"Error: <<for>>: invalid syntax, for\u{2026}of is not supported; see: for\u{2026}range"
)]
#[case(
	"<<for $a.b range [1]>>x<</for>>",
	"Error: <<for>>: invalid range form syntax, format: [index ,] value range collection"
)]
#[case("<<for _v range 5>>x<</for>>", "Error: <<for>>: unsupported range expression type: number")]
#[case(
	"<<for _i to 0; _i lt 1>>x<</for>>",
	"Error: <<for>>: invalid 3-part conditional form syntax, format: [init] ; [condition] ; [post]"
)]
fn test_control_macro_errors(#[case] source: &str, #[case] expected: &str) {
	let mut stage = Stage::new();
	stage.render(source);
	assert_eq!(stage.errors(), vec![expected]);
}

#[test]
fn test_if_reports_bad_conditions_by_clause() {
	let mut stage = Stage::new();
	assert_eq!(stage.render("<<if true>>ok<<elseif 1 +>>never<</if>>"), "ok");

	stage.render("<<if false>>a<<elseif 1 +>>b<</if>>");
	let errors = stage.errors();
	assert_eq!(errors.len(), 1);
	assert!(
		errors[0].starts_with("Error: <<if>>: bad conditional expression in <<elseif>> clause (#1): "),
		"{errors:?}"
	);
}

#[test]
fn test_if_assignment_check_can_be_disabled() {
	let mut config = Config::default();
	config.macros.if_assignment_error = false;
	let mut stage = Stage::with_config(config);
	assert_eq!(stage.render("<<if $x to 1>>set<</if>>"), "set");
	assert_eq!(stage.var("$x"), Value::Number(1.0));
}

#[rstest]
#[case("<<set _v to \"b\">><<switch _v>>ignored<<case \"a\">>A<<case \"b\" \"c\">>BC<<default>>D<</switch>>", "BC")]
#[case("<<switch 5>><<case \"5\">>string<<case 5>>number<</switch>>", "number")]
#[case("<<switch 9>><<case 1>>one<<default>>other<</switch>>", "other")]
#[case("<<switch 9>><<case 1>>one<</switch>>", "")]
#[case("<<switch [1]>><<case 1>>one<<default>>lists never match<</switch>>", "lists never match")]
fn test_switch_matches_strictly(#[case] source: &str, #[case] expected: &str) {
	let mut stage = Stage::new();
	assert_eq!(stage.render(source), expected);
	assert!(stage.errors().is_empty());
}

#[rstest]
#[case("<<for _i to 0; _i lt 3; _i to _i + 1>><<print _i>><</for>>", "012")]
#[case("<<set _n to 0>><<for _n lt 2>>x<<set _n to _n + 1>><</for>>", "xx")]
#[case("<<for _k, _v range [\"a\", \"b\"]>><<print _k + _v>><</for>>", "0a1b")]
#[case("<<for _c range \"h\u{e9}\">><<print _c>>.<</for>>", "h.\u{e9}.")]
#[case("<<for _i to 0; ; _i to _i + 1>><<if _i is 3>><<break>><</if>><<print _i>><</for>>", "012")]
#[case("<<for _i to 0; _i lt 4; _i to _i + 1>><<if _i is 1>><<continue>><</if>><<print _i>><</for>>", "023")]
#[case("<<set _n to 0>><<for>><<set _n to _n + 1>><<if _n gt 2>><<break>><</if>>n<</for>>", "nn")]
#[case("<<for>>\nx\n<<break>>\n<</for>>", "x")]
#[case("<<for _i to 0; _i lt 2; _i to _i + 1>>\n<<print _i>>\n<</for>>", "0<br>1")]
fn test_for_forms(#[case] source: &str, #[case] expected: &str) {
	let mut stage = Stage::new();
	assert_eq!(stage.render(source), expected);
	assert!(stage.errors().is_empty());
}

#[test]
fn test_break_only_leaves_the_nearest_loop() {
	let mut stage = Stage::new();
	let html = stage.render("<<for _o range [1, 2]>><<for _i range [1, 2, 3]>><<if _i is 2>><<break>><</if>><<print _o * 10 + _i>> <</for>><</for>>end");
	assert_eq!(html, "11 21 end");
	assert!(stage.rt.loop_signal.is_none());
}

#[test]
fn test_for_stops_at_iteration_limit() {
	let mut config = Config::default();
	config.macros.max_loop_iterations = 5;
	let mut stage = Stage::with_config(config);
	let html = stage.render("<<for true>>a<</for>>");
	assert!(html.starts_with("aaaaa<div class=\"error-view\">"), "{html}");
	assert_eq!(stage.errors(), vec!["Error: <<for>>: exceeded configured maximum loop iterations (5)"]);
}

#[test]
fn test_if_debug_views_mark_skipped_clauses() {
	let mut stage = Stage::with_config(Config {
		debug: true,
		..Config::default()
	});
	let html = stage.render("<<if false>>a<<else>>b<</if>>");
	assert_eq!(
		html,
		concat!(
			"<span title=\"<<if false>>\" aria-label=\"<<if false>>\" data-type=\"macro\" data-name=\"if\" class=\"debug hidden invalid\"></span>",
			"<wbr class=\"debug hidden\">",
			"<span title=\"<<else>>\" aria-label=\"<<else>>\" data-type=\"macro\" data-name=\"else\" class=\"debug\">b</span>",
			"<wbr class=\"debug hidden\">",
			"<span title=\"<</if>>\" aria-label=\"<</if>>\" data-type=\"macro\" data-name=\"/if\" class=\"debug\"></span>",
			"<wbr class=\"debug hidden\">",
		)
	);
}

#[test]
fn test_switch_debug_view_is_invalid_without_a_match() {
	let mut stage = Stage::with_config(Config {
		debug: true,
		..Config::default()
	});
	stage.render("<<switch 2>><<case 1>>a<</switch>>");
	let doc = stage.rt.doc();
	let switch = doc.select("[data-name=switch]").expect("selector");
	assert_eq!(doc.classes(switch[0]), vec!["debug", "hidden", "invalid"]);
	let close = doc.select("[data-name='/switch']").expect("selector");
	assert_eq!(doc.classes(close[0]), vec!["debug", "hidden", "invalid"]);
}

#[test]
fn test_break_in_deferred_work_does_not_leak() {
	let mut stage = Stage::new();
	stage.render("<<for _i range [1]>><<done>><<break>><</done>><</for>>");
	stage.rt.run_until_idle();
	assert!(stage.rt.loop_signal.is_none());
	assert_eq!(stage.render("a<<set _x to 1>>b"), "ab");
}
