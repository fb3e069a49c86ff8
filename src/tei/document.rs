/// TEI document — the parts of a drama file the annotator reads and
/// writes.
///
/// The file is kept as its full event stream so that everything the
/// annotator does not touch is written back as it was read. An element
/// index on top of the events answers the few structural questions the
/// driver asks: previous sibling, enclosing speech, text and tail.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use rustc_hash::FxHashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::driver::{Annotation, StageDirection};
use crate::schema::character::{Character, CharacterId, CharacterKind};
use crate::schema::mention::MentionSet;

#[derive(Debug, Error)]
pub enum TeiError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialized document is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("<{element}> in the person list has no xml:id")]
    MissingId { element: String },
}

/// Heading text that opens a new group of characters on stage.
const SCENE_HEADING_MARKER: &str = "Auftritt";

#[derive(Debug, Clone)]
struct ElementNode {
    /// Local name, prefix stripped.
    name: String,
    /// Event index of the start (or empty) tag.
    start: usize,
    /// Event index of the end tag; equals `start` for empty elements.
    end: usize,
    parent: Option<usize>,
    previous: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionKind {
    Scene,
    Act,
}

impl DivisionKind {
    fn type_value(&self) -> &'static str {
        match self {
            Self::Scene => "scene",
            Self::Act => "act",
        }
    }
}

/// A `stage` element with the view of it the driver needs.
#[derive(Debug, Clone)]
pub struct StageRef {
    pub element: usize,
    pub direction: StageDirection,
}

/// One top-level division and its stage directions in document order.
#[derive(Debug, Clone)]
pub struct Division {
    pub kind: DivisionKind,
    pub stages: Vec<StageRef>,
}

/// Current `type` and `who` of a stage element, written or original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageAttributes {
    pub text: String,
    pub movement: Option<String>,
    pub who: Option<String>,
}

pub struct TeiDocument {
    events: Vec<Event<'static>>,
    elements: Vec<ElementNode>,
    annotations: FxHashMap<usize, Annotation>,
}

impl TeiDocument {
    pub fn load(path: &Path) -> Result<TeiDocument, TeiError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(xml: &str) -> Result<TeiDocument, TeiError> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let mut reader = Reader::from_str(xml);
        let mut events = Vec::new();
        let mut elements: Vec<ElementNode> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        // last element seen at each open depth; index 0 is the document
        let mut last_child: Vec<Option<usize>> = vec![None];

        loop {
            let event = reader.read_event()?;
            let index = events.len();
            match &event {
                Event::Start(e) | Event::Empty(e) => {
                    let node = elements.len();
                    let previous = last_child.last().copied().flatten();
                    if let Some(slot) = last_child.last_mut() {
                        *slot = Some(node);
                    }
                    elements.push(ElementNode {
                        name: local_name(e),
                        start: index,
                        end: index,
                        parent: open.last().copied(),
                        previous,
                    });
                    if matches!(event, Event::Start(_)) {
                        open.push(node);
                        last_child.push(None);
                    }
                }
                Event::End(_) => {
                    if let Some(node) = open.pop() {
                        elements[node].end = index;
                        last_child.pop();
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            events.push(event.into_owned());
        }

        Ok(TeiDocument {
            events,
            elements,
            annotations: FxHashMap::default(),
        })
    }

    /// Every `person` and `personGrp` with its `persName`/`name` texts.
    pub fn characters(&self) -> Result<Vec<Character>, TeiError> {
        let mut characters = Vec::new();
        for (node, element) in self.elements.iter().enumerate() {
            let kind = match element.name.as_str() {
                "person" => CharacterKind::Person,
                "personGrp" => CharacterKind::Group,
                _ => continue,
            };
            let id = self
                .attribute(node, b"xml:id")
                .ok_or_else(|| TeiError::MissingId {
                    element: element.name.clone(),
                })?;
            let names = self
                .descendants(node)
                .filter(|&d| matches!(self.elements[d].name.as_str(), "persName" | "name"))
                .map(|d| self.text_content(d).trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
            characters.push(Character {
                id: CharacterId::new(id),
                kind,
                names,
            });
        }
        Ok(characters)
    }

    /// Scene divisions, or act divisions when the play has no scenes.
    pub fn divisions(&self) -> Vec<Division> {
        let scenes = self.divisions_of(DivisionKind::Scene);
        if scenes.is_empty() {
            self.divisions_of(DivisionKind::Act)
        } else {
            scenes
        }
    }

    fn divisions_of(&self, kind: DivisionKind) -> Vec<Division> {
        (0..self.elements.len())
            .filter(|&node| {
                self.elements[node].name == "div"
                    && self.attribute(node, b"type").as_deref() == Some(kind.type_value())
            })
            .map(|node| Division {
                kind,
                stages: self
                    .descendants(node)
                    .filter(|&d| self.elements[d].name == "stage")
                    .map(|d| StageRef {
                        element: d,
                        direction: self.stage_direction(d),
                    })
                    .collect(),
            })
            .collect()
    }

    fn stage_direction(&self, node: usize) -> StageDirection {
        let mut text = self.text_content(node);
        if text.trim().is_empty() {
            text = self.tail(node);
        }
        let after_scene_heading = self.elements[node].previous.is_some_and(|prev| {
            self.elements[prev].name == "head"
                && self.text_content(prev).contains(SCENE_HEADING_MARKER)
        });
        let speaker = self
            .ancestors(node)
            .filter(|&a| self.elements[a].name == "sp")
            .find_map(|a| self.attribute(a, b"who"))
            .map(|who| MentionSet::from_who(&who))
            .unwrap_or_default();
        StageDirection {
            text,
            after_scene_heading,
            speaker,
            who: self.attribute(node, b"who").map(|w| MentionSet::from_who(&w)),
        }
    }

    /// Record the attributes to write for a stage element. A later call
    /// for the same element replaces the earlier one.
    pub fn annotate(&mut self, element: usize, annotation: Annotation) {
        let start = self.elements[element].start;
        self.annotations.insert(start, annotation);
    }

    /// `type`/`who` of every stage element in document order, with
    /// recorded annotations taking precedence over the source.
    pub fn stage_attributes(&self) -> Vec<StageAttributes> {
        (0..self.elements.len())
            .filter(|&node| self.elements[node].name == "stage")
            .map(|node| {
                let text = self.text_content(node).trim().to_string();
                match self.annotations.get(&self.elements[node].start) {
                    Some(a) => StageAttributes {
                        text,
                        movement: Some(a.movement.as_str().to_string()),
                        who: Some(a.who.to_who()),
                    },
                    None => StageAttributes {
                        text,
                        movement: self.attribute(node, b"type"),
                        who: self.attribute(node, b"who"),
                    },
                }
            })
            .collect()
    }

    /// Serialize, rewriting the start tags of annotated stage elements.
    pub fn to_xml(&self) -> Result<String, TeiError> {
        let mut writer = Writer::new(Vec::new());
        for (index, event) in self.events.iter().enumerate() {
            match (self.annotations.get(&index), event) {
                (Some(a), Event::Start(e)) => {
                    writer.write_event(Event::Start(annotated_start(e, a)?))?
                }
                (Some(a), Event::Empty(e)) => {
                    writer.write_event(Event::Empty(annotated_start(e, a)?))?
                }
                _ => writer.write_event(event.borrow())?,
            }
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }

    pub fn save(&self, path: &Path) -> Result<(), TeiError> {
        std::fs::write(path, self.to_xml()?)?;
        Ok(())
    }

    fn start_tag(&self, node: usize) -> Option<&BytesStart<'static>> {
        match &self.events[self.elements[node].start] {
            Event::Start(e) | Event::Empty(e) => Some(e),
            _ => None,
        }
    }

    fn attribute(&self, node: usize, key: &[u8]) -> Option<String> {
        let start = self.start_tag(node)?;
        start
            .attributes()
            .flatten()
            .find(|attr| attr.key.as_ref() == key)
            .map(|attr| match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            })
    }

    fn descendants(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        let end = self.elements[node].end;
        (node + 1..self.elements.len()).take_while(move |&d| self.elements[d].start < end)
    }

    fn ancestors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.elements[node].parent, move |&a| self.elements[a].parent)
    }

    /// All text inside the element, descendants included.
    fn text_content(&self, node: usize) -> String {
        let element = &self.elements[node];
        self.events[element.start + 1..element.end.max(element.start + 1)]
            .iter()
            .filter_map(event_text)
            .collect()
    }

    /// Text directly after the element's end tag, up to the next tag.
    fn tail(&self, node: usize) -> String {
        self.events[self.elements[node].end + 1..]
            .iter()
            .map_while(event_text)
            .collect()
    }
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn event_text(event: &Event<'_>) -> Option<String> {
    match event {
        Event::Text(t) => Some(match t.unescape() {
            Ok(text) => text.into_owned(),
            Err(_) => String::from_utf8_lossy(t).into_owned(),
        }),
        Event::CData(c) => Some(String::from_utf8_lossy(c).into_owned()),
        _ => None,
    }
}

/// Copy of `start` with `type` and `who` replaced.
fn annotated_start(
    start: &BytesStart<'_>,
    annotation: &Annotation,
) -> Result<BytesStart<'static>, TeiError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut rewritten = BytesStart::new(name);
    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        if key == b"type" || key == b"who" {
            continue;
        }
        rewritten.push_attribute(attr);
    }
    let who = annotation.who.to_who();
    rewritten.push_attribute(("type", annotation.movement.as_str()));
    rewritten.push_attribute(("who", who.as_str()));
    Ok(rewritten)
}
