//! Markup renderer.
//!
//! Walks wikitext left to right and builds nodes under an output node:
//! plain text, line breaks, character references, inline HTML, `[[links]]`,
//! and `<<macro>>` invocations. Anything that fails to parse as markup is
//! kept as text.
//!
//! A pending `<<break>>` or `<<continue>>` ends the render after the macro
//! that raised it.

use std::sync::LazyLock;

use quire_dom::{NodeId, is_void_element};
use quire_invocation::{Argument, LinkArg, parse_args, parse_tag};
use regex::Regex;

use crate::context::MacroOutcome;
use crate::runtime::Runtime;

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"^<(/?)([A-Za-z][\w-]*)((?:\s+[^\s/>"'=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)\s*(/?)>"#)
		.expect("static regex")
});
static HTML_ATTR_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"([^\s/>"'=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#).expect("static regex"));
static CHAR_REF_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|([A-Za-z][A-Za-z0-9]{1,31}));").expect("static regex"));

const NAMED_REFS: &[(&str, char)] = &[
	("amp", '&'),
	("lt", '<'),
	("gt", '>'),
	("quot", '"'),
	("apos", '\''),
	("nbsp", '\u{a0}'),
	("hellip", '\u{2026}'),
	("mdash", '\u{2014}'),
	("ndash", '\u{2013}'),
	("copy", '\u{a9}'),
	("lsquo", '\u{2018}'),
	("rsquo", '\u{2019}'),
	("ldquo", '\u{201c}'),
	("rdquo", '\u{201d}'),
];

/// Counts of what a render pass invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
	/// Macro tags dispatched, including unknown ones.
	pub macros: usize,
	/// Invocations that ended in an error view.
	pub failed: usize,
}

impl RenderSummary {
	fn record(&mut self, outcome: MacroOutcome) {
		self.macros += 1;
		if outcome == MacroOutcome::Failed {
			self.failed += 1;
		}
	}
}

struct Wikifier<'s> {
	source: &'s str,
	pos: usize,
	text_start: usize,
	output: NodeId,
	/// Open inline elements and their tag names, innermost last.
	open: Vec<(NodeId, String)>,
	summary: RenderSummary,
}

/// Renders `source` into `output`.
pub(crate) fn wikify(rt: &mut Runtime, output: NodeId, source: &str) -> RenderSummary {
	let mut w = Wikifier {
		source,
		pos: 0,
		text_start: 0,
		output,
		open: Vec::new(),
		summary: RenderSummary::default(),
	};

	while let Some(offset) = source[w.pos..].find(['<', '[', '&', '\n']) {
		let at = w.pos + offset;
		let rest = &source[at..];
		let (consumed, skip) = if rest.starts_with("<<") {
			(w.macro_tag(rt, at), 2)
		} else if rest.starts_with('<') {
			(w.html_tag(rt, at), 1)
		} else if rest.starts_with("[[") {
			(w.link(rt, at), 2)
		} else if rest.starts_with('&') {
			(w.char_ref(rt, at), 1)
		} else if rest.starts_with('\n') {
			(Some(w.line_break(rt, at)), 1)
		} else {
			(None, 1)
		};
		match consumed {
			Some(end) => {
				w.pos = end;
				w.text_start = end;
			}
			None => w.pos = at + skip,
		}
		if rt.loop_signal.is_some() {
			break;
		}
	}
	if rt.loop_signal.is_none() {
		w.flush_text(rt, source.len());
	} else {
		w.drop_trailing_break(rt);
	}
	w.summary
}

impl Wikifier<'_> {
	fn current(&self) -> NodeId {
		self.open.last().map_or(self.output, |(node, _)| *node)
	}

	fn flush_text(&mut self, rt: &mut Runtime, end: usize) {
		if end > self.text_start {
			let current = self.current();
			rt.doc.append_text(current, &self.source[self.text_start..end]);
		}
		self.text_start = end;
	}

	/// Drops the line break an interrupted render left at the end.
	fn drop_trailing_break(&self, rt: &mut Runtime) {
		let current = self.current();
		if let Some(&last) = rt.doc.children(current).last()
			&& rt.doc.tag(last) == Some("br")
		{
			rt.doc.remove(last);
		}
	}

	fn macro_tag(&mut self, rt: &mut Runtime, at: usize) -> Option<usize> {
		let tag = parse_tag(self.source, at)?;
		self.flush_text(rt, at);
		let current = self.current();
		let (end, outcome) = rt.dispatch_tag(current, self.source, &tag);
		self.summary.record(outcome);
		Some(end)
	}

	fn html_tag(&mut self, rt: &mut Runtime, at: usize) -> Option<usize> {
		let caps = HTML_TAG_RE.captures(&self.source[at..])?;
		let end = at + caps[0].len();
		let closing = !caps[1].is_empty();
		let tag = caps[2].to_ascii_lowercase();

		if closing {
			let depth = self.open.iter().rposition(|(_, open)| *open == tag)?;
			self.flush_text(rt, at);
			self.open.truncate(depth);
			return Some(end);
		}

		self.flush_text(rt, at);
		let element = rt.doc.create_element(&tag);
		for attr in HTML_ATTR_RE.captures_iter(&caps[3]) {
			let value = attr.get(2).or_else(|| attr.get(3)).or_else(|| attr.get(4)).map_or("", |m| m.as_str());
			rt.doc.set_attr(element, &attr[1].to_ascii_lowercase(), decode_char_refs(value));
		}
		let current = self.current();
		rt.doc.append(current, element);
		if caps[4].is_empty() && !is_void_element(&tag) {
			self.open.push((element, tag));
		}
		Some(end)
	}

	fn link(&mut self, rt: &mut Runtime, at: usize) -> Option<usize> {
		let close = self.source[at..].find("]]")?;
		let end = at + close + 2;
		let args = parse_args(&self.source[at..end], rt).ok()?;
		let link = match args.get(0) {
			Some(Argument::Link(link)) if args.len() == 1 => link.clone(),
			_ => return None,
		};

		self.flush_text(rt, at);
		let current = self.current();
		let anchor = create_link(rt, &link);
		rt.doc.append(current, anchor);
		Some(end)
	}

	fn char_ref(&mut self, rt: &mut Runtime, at: usize) -> Option<usize> {
		let caps = CHAR_REF_RE.captures(&self.source[at..])?;
		let ch = decode_char_ref(&caps)?;
		self.flush_text(rt, at);
		let current = self.current();
		rt.doc.append_text(current, ch.encode_utf8(&mut [0; 4]));
		Some(at + caps[0].len())
	}

	fn line_break(&mut self, rt: &mut Runtime, at: usize) -> usize {
		self.flush_text(rt, at);
		let br = rt.doc.create_element("br");
		let current = self.current();
		rt.doc.append(current, br);
		at + 1
	}
}

fn create_link(rt: &mut Runtime, link: &LinkArg) -> NodeId {
	let anchor = rt.doc.create_element("a");
	if link.external {
		rt.doc.add_class(anchor, "link-external");
		rt.doc.set_attr(anchor, "href", link.link.as_str());
		rt.doc.set_attr(anchor, "target", "_blank");
	} else {
		let class = if rt.story().has(&link.link) { "link-internal" } else { "link-broken" };
		rt.doc.add_class(anchor, class);
		rt.doc.set_attr(anchor, "data-passage", link.link.as_str());
		if let Some(setter) = &link.setter {
			rt.doc.set_attr(anchor, "data-setter", setter.as_str());
		}
	}
	rt.doc.set_attr(anchor, "tabindex", "0");
	rt.doc.append_text(anchor, &link.text);
	anchor
}

fn decode_char_ref(caps: &regex::Captures<'_>) -> Option<char> {
	if let Some(dec) = caps.get(1) {
		return dec.as_str().parse().ok().and_then(char::from_u32);
	}
	if let Some(hex) = caps.get(2) {
		return u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32);
	}
	let name = caps.get(3)?.as_str();
	NAMED_REFS.iter().find(|(n, _)| *n == name).map(|&(_, ch)| ch)
}

/// Decodes the character references the renderer knows, leaving others as written.
fn decode_char_refs(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(idx) = rest.find('&') {
		out.push_str(&rest[..idx]);
		rest = &rest[idx..];
		match CHAR_REF_RE.captures(rest).and_then(|caps| Some((caps[0].len(), decode_char_ref(&caps)?))) {
			Some((len, ch)) => {
				out.push(ch);
				rest = &rest[len..];
			}
			None => {
				out.push('&');
				rest = &rest[1..];
			}
		}
	}
	out.push_str(rest);
	out
}
