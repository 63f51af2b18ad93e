use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::{fixture, rstest};

use super::*;

/// `<div id="box" class="a b"><p class="x">one</p><span>two<p>three</p></span></div><p>four</p>`
struct Sample {
	doc: Document,
	div: NodeId,
	p1: NodeId,
	span: NodeId,
	p2: NodeId,
	p3: NodeId,
}

#[fixture]
fn sample() -> Sample {
	let mut doc = Document::new();
	let root = doc.root();
	let div = doc.create_element("div");
	doc.set_attr(div, "id", "box");
	doc.add_class(div, "a b");
	let p1 = doc.create_element("p");
	doc.add_class(p1, "x");
	doc.append_text(p1, "one");
	let span = doc.create_element("span");
	doc.append_text(span, "two");
	let p2 = doc.create_element("p");
	doc.append_text(p2, "three");
	let p3 = doc.create_element("p");
	doc.append_text(p3, "four");

	doc.append(span, p2);
	doc.append(div, p1);
	doc.append(div, span);
	doc.append(root, div);
	doc.append(root, p3);
	Sample { doc, div, p1, span, p2, p3 }
}

#[rstest]
fn test_serialization(sample: Sample) {
	insta::assert_snapshot!(
		sample.doc.inner_html(sample.doc.root()),
		@r#"<div id="box" class="a b"><p class="x">one</p><span>two<p>three</p></span></div><p>four</p>"#
	);
}

#[rstest]
#[case("p", 3)]
#[case("#box", 1)]
#[case(".a.b", 1)]
#[case("div p", 2)]
#[case("div > p", 1)]
#[case("span p, .x", 2)]
#[case("[id]", 1)]
#[case("[id=box]", 1)]
#[case("[id='nope']", 0)]
#[case("*", 6)]
#[case("section", 0)]
fn test_select_counts(sample: Sample, #[case] selector: &str, #[case] count: usize) {
	assert_eq!(sample.doc.select(selector).expect("valid selector").len(), count, "{selector}");
}

#[rstest]
fn test_select_is_in_document_order(sample: Sample) {
	assert_eq!(sample.doc.select("p").expect("selector"), vec![sample.p1, sample.p2, sample.p3]);
	assert_eq!(sample.doc.select(".x, #box").expect("selector"), vec![sample.div, sample.p1]);
}

#[rstest]
#[case("")]
#[case("  ")]
#[case("p:first-child")]
#[case("div >")]
#[case("> p")]
#[case("p,")]
#[case("#")]
fn test_invalid_selectors(#[case] selector: &str) {
	assert!(Document::new().select(selector).is_err(), "{selector:?} should not parse");
}

#[rstest]
fn test_detached_nodes_are_not_selected(mut sample: Sample) {
	sample.doc.detach(sample.span);
	assert_eq!(sample.doc.select("p").expect("selector"), vec![sample.p1, sample.p3]);
	assert!(!sample.doc.is_attached(sample.p2));
	assert_eq!(sample.doc.text_content(sample.span), "twothree");
}

#[rstest]
fn test_class_operations_are_idempotent(mut sample: Sample) {
	let doc = &mut sample.doc;
	doc.add_class(sample.div, "c");
	doc.add_class(sample.div, "c a");
	assert_eq!(doc.classes(sample.div), vec!["a", "b", "c"]);

	doc.toggle_class(sample.div, "a d");
	assert_eq!(doc.classes(sample.div), vec!["b", "c", "d"]);

	doc.remove_class(sample.div, "b zz");
	doc.remove_class(sample.div, "b");
	assert_eq!(doc.classes(sample.div), vec!["c", "d"]);

	doc.clear_classes(sample.div);
	assert!(!doc.has_attr(sample.div, "class"));
}

#[rstest]
fn test_fragments_move_their_children(mut sample: Sample) {
	let doc = &mut sample.doc;
	let frag = doc.create_fragment();
	doc.append_text(frag, "new ");
	let em = doc.create_element("em");
	doc.append(frag, em);

	doc.prepend(sample.span, frag);
	assert!(!doc.has_children(frag));
	assert_eq!(doc.inner_html(sample.span), "new <em></em>two<p>three</p>");
}

#[rstest]
fn test_empty_and_deep_clone(mut sample: Sample) {
	let doc = &mut sample.doc;
	let copy = doc.deep_clone(sample.div);
	doc.empty(sample.div);
	assert_eq!(doc.outer_html(sample.div), r#"<div id="box" class="a b"></div>"#);
	assert_eq!(doc.inner_html(copy), r#"<p class="x">one</p><span>two<p>three</p></span>"#);
	assert_eq!(doc.parent(sample.p1), None);
}

#[rstest]
fn test_removed_subtrees_are_freed_and_reused(mut sample: Sample) {
	let doc = &mut sample.doc;
	let live = doc.node_count();
	doc.remove(sample.span);
	assert_eq!(doc.node_count(), live - 4);
	assert!(!doc.contains(sample.span) && !doc.contains(sample.p2));
	assert_eq!(doc.text_content(sample.span), "");
	assert_eq!(doc.select("p").expect("selector"), vec![sample.p1, sample.p3]);

	let capacity = doc.capacity();
	let fresh: Vec<NodeId> = (0..4).map(|_| doc.create_element("i")).collect();
	assert_eq!(doc.capacity(), capacity);
	assert!(!fresh.contains(&sample.span));
}

#[rstest]
fn test_stale_handles_do_not_reach_reused_slots(mut sample: Sample) {
	let doc = &mut sample.doc;
	let capacity = doc.capacity();
	doc.remove(sample.p1);
	let reused: Vec<NodeId> = (0..2).map(|_| doc.create_element("em")).collect();
	assert_eq!(doc.capacity(), capacity);
	for &em in &reused {
		doc.append(sample.div, em);
	}

	doc.set_attr(sample.p1, "id", "ghost");
	doc.append_text(sample.p1, "ghost");
	doc.append(sample.p1, sample.p3);
	for &em in &reused {
		assert_eq!(doc.attr(em, "id"), None);
		assert!(!doc.has_children(em));
	}
	assert_eq!(doc.parent(sample.p3), Some(doc.root()));
	assert_eq!(doc.inner_html(sample.div), "<span>two<p>three</p></span><em></em><em></em>");
}

#[test]
fn test_root_is_never_freed() {
	let mut doc = Document::new();
	let root = doc.root();
	doc.remove(root);
	assert!(doc.contains(root));
	assert_eq!(doc.node_count(), 1);
}

#[rstest]
fn test_emptying_frees_children(mut sample: Sample) {
	let doc = &mut sample.doc;
	let live = doc.node_count();
	doc.empty(sample.div);
	assert_eq!(doc.node_count(), live - 6);
	assert!(doc.contains(sample.div));
	assert!(!doc.contains(sample.p1));
}

#[test]
fn test_text_is_escaped_but_attributes_keep_angle_brackets() {
	let mut doc = Document::new();
	let root = doc.root();
	let a = doc.create_element("a");
	doc.set_attr(a, "title", "<\"x\" & y>");
	doc.append_text(a, "<b>&nbsp;</b>");
	let br = doc.create_element("br");
	doc.append(root, a);
	doc.append(root, br);
	assert_eq!(doc.inner_html(root), "<a title=\"<&quot;x&quot; &amp; y>\">&lt;b&gt;&amp;nbsp;&lt;/b&gt;</a><br>");
}

#[test]
fn test_append_into_own_subtree_is_ignored() {
	let mut doc = Document::new();
	let outer = doc.create_element("div");
	let inner = doc.create_element("div");
	doc.append(outer, inner);
	doc.append(inner, outer);
	assert_eq!(doc.parent(outer), None);
	assert_eq!(doc.children(inner), &[] as &[NodeId]);
}

#[test]
fn test_debug_view_lifecycle() {
	let mut doc = Document::new();
	let root = doc.root();
	let view = DebugView::new(&mut doc, root, "macro", "print", "<<print 1>>");
	doc.append_text(view.output(), "1");

	view.set_modes(&mut doc, DebugModes::HIDDEN | DebugModes::BLOCK, true);
	view.set_modes(&mut doc, DebugModes::BLOCK, false);
	assert_eq!(view.modes(&doc), DebugModes::HIDDEN);
	insta::assert_snapshot!(
		doc.inner_html(root),
		@r#"<span title="<<print 1>>" aria-label="<<print 1>>" data-type="macro" data-name="print" class="debug hidden">1</span><wbr class="debug hidden">"#
	);

	view.remove(&mut doc);
	assert_eq!(doc.inner_html(root), "1");
}

#[test]
fn test_debug_view_toggle() {
	let mut doc = Document::new();
	assert!(!DebugView::is_enabled(&doc));
	DebugView::toggle(&mut doc);
	assert!(DebugView::is_enabled(&doc));
	DebugView::toggle(&mut doc);
	assert!(!DebugView::is_enabled(&doc));
}

proptest! {
	#[test]
	fn prop_add_class_twice_equals_once(names in prop::collection::vec("[a-z]{1,4}", 1..5)) {
		let mut once = Document::new();
		let mut twice = Document::new();
		let a = once.create_element("div");
		let b = twice.create_element("div");
		let joined = names.join(" ");
		once.add_class(a, &joined);
		twice.add_class(b, &joined);
		twice.add_class(b, &joined);
		prop_assert_eq!(once.classes(a), twice.classes(b));
	}
}
