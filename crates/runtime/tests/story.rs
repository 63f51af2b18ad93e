use pretty_assertions::assert_eq;
use quire_runtime::{Config, Runtime, RuntimeError, Story, error_texts};

const STORY: &str = r##"
[[passage]]
name = "Start"
text = """
<span id="door" class="closed">A door.</span>
<<done>><<removeclass "#door" "closed">><<addclass "#door" "open">><</done>>
<<goto "Hall">>"""

[[passage]]
name = "Hall"
tags = ["nobr"]
text = """
<<set $visits to ($visits || 0) + 1>>
Visits: <<print $visits>>
[[Back|Start]] [[Exit|Nowhere]]"""
"##;

fn runtime() -> Runtime {
	let story = Story::parse(STORY).expect("story parses");
	Runtime::new(Config::default(), story).expect("runtime")
}

#[test]
fn test_play_renders_passage_into_container() {
	let mut rt = runtime();
	let passage = rt.start().expect("start");
	assert_eq!(rt.active_passage(), Some(passage));
	assert_eq!(rt.history(), ["Start"]);
	insta::assert_snapshot!(
		rt.html(),
		@r#"<div id="passage-start" class="passage" data-passage="Start"><span id="door" class="closed">A door.</span><br><br></div>"#
	);
	assert_eq!(rt.tasks().len(), 2);
}

#[test]
fn test_deferred_work_runs_in_order() {
	let mut rt = runtime();
	rt.start().expect("start");

	rt.advance(40);
	assert_eq!(rt.history(), ["Start", "Hall"]);
	insta::assert_snapshot!(
		rt.html(),
		@r#"<div id="passage-hall" class="passage" data-passage="Hall" data-tags="nobr"> Visits: 1 <a class="link-internal" data-passage="Start" tabindex="0">Back</a> <a class="link-broken" data-passage="Nowhere" tabindex="0">Exit</a></div>"#
	);
	assert!(rt.take_deferred_errors().is_empty());
}

#[test]
fn test_selector_macros_see_only_attached_content() {
	let story = Story::parse(
		r##"
[[passage]]
name = "Start"
text = '<span id="x"></span><<addclass "#x" "now">>'
"##,
	)
	.expect("story parses");
	let mut rt = Runtime::new(Config::default(), story).expect("runtime");
	let passage = rt.start().expect("start");
	assert_eq!(
		error_texts(rt.doc(), passage),
		vec!["Error: <<addclass>>: no elements matched the selector \"#x\""]
	);
}

#[test]
fn test_unknown_passage() {
	let mut rt = runtime();
	assert!(matches!(rt.play("Chapter 2"), Err(RuntimeError::UnknownPassage(name)) if name == "Chapter 2"));
	assert!(rt.history().is_empty());
}

#[test]
fn test_replaying_passages_keeps_the_document_bounded() {
	let mut rt = runtime();
	rt.play("Hall").expect("play");
	let first = rt.active_passage().expect("active");
	rt.play("Hall").expect("replay");
	assert!(!rt.doc().contains(first));
	let (live, capacity) = (rt.doc().node_count(), rt.doc().capacity());

	for _ in 0..1000 {
		rt.play("Hall").expect("replay");
	}
	assert_eq!(rt.doc().node_count(), live);
	assert_eq!(rt.doc().capacity(), capacity);
	assert!(rt.text().contains("Visits: 1002"));
	assert_eq!(rt.doc().children(rt.passages()).len(), 1);
}

#[test]
fn test_load_story_and_config_from_disk() {
	let dir = tempfile::tempdir().expect("tempdir");
	let story_path = dir.path().join("story.toml");
	let config_path = dir.path().join("quire.toml");
	std::fs::write(&story_path, STORY).expect("write story");
	std::fs::write(&config_path, "dom_delay_ms = 5\n[passages]\nstart = \"Hall\"\n").expect("write config");

	let config = Config::load(&config_path).expect("config");
	let story = Story::load(&story_path).expect("story");
	let mut rt = Runtime::new(config, story).expect("runtime");
	rt.start().expect("start");
	assert_eq!(rt.history(), ["Hall"]);
	assert!(rt.text().contains("Visits: 1"));
}

#[tokio::test(start_paused = true)]
async fn test_realtime_driver_sleeps_until_deadlines() {
	let mut rt = runtime();
	rt.start().expect("start");

	let started = tokio::time::Instant::now();
	let report = rt.run_realtime().await;
	assert_eq!(report.completed(), 2);
	assert!(started.elapsed() >= std::time::Duration::from_millis(40));
	assert_eq!(rt.history(), ["Start", "Hall"]);
}
