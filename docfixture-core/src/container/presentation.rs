//! PresentationML (`.pptx`)

use super::opc::{rel_types, OpcPackage, OFFICE_RELATIONSHIPS_NS};
use super::{needs_space_preserve, Paragraph, PartGraph};
use quick_xml::escape::escape;

pub const PRESENTATION_PART: &str = "ppt/presentation.xml";

pub const PRESENTATION_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
pub const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

const PRESENTATION_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// Slide ids below 256 are reserved
const FIRST_SLIDE_ID: u32 = 256;

/// A shape of a slide's shape tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    pub name: String,
    /// `None` for shapes without a text body
    pub text_body: Option<Vec<Paragraph>>,
}

impl Shape {
    pub fn text_box<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            text_body: Some(lines.into_iter().map(Paragraph::from_text).collect()),
        }
    }

    pub fn without_text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text_body: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slide {
    pub shapes: Vec<Shape>,
}

impl Slide {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    /// Markup of `ppt/slides/slideN.xml`
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<p:sld xmlns:p=\"{PRESENTATION_NS}\" xmlns:a=\"{DRAWING_NS}\">\n"
        ));
        xml.push_str("    <p:cSld>\n");
        xml.push_str("        <p:spTree>\n");
        xml.push_str("            <p:nvGrpSpPr>\n");
        xml.push_str("                <p:cNvPr id=\"1\" name=\"\"/>\n");
        xml.push_str("                <p:cNvGrpSpPr/>\n");
        xml.push_str("                <p:nvPr/>\n");
        xml.push_str("            </p:nvGrpSpPr>\n");
        xml.push_str("            <p:grpSpPr/>\n");

        // id 1 belongs to the group shape above
        for (position, shape) in self.shapes.iter().enumerate() {
            xml.push_str("            <p:sp>\n");
            xml.push_str("                <p:nvSpPr>\n");
            xml.push_str(&format!(
                "                    <p:cNvPr id=\"{}\" name=\"{}\"/>\n",
                position + 2,
                escape(shape.name.as_str())
            ));
            xml.push_str("                    <p:cNvSpPr/>\n");
            xml.push_str("                    <p:nvPr/>\n");
            xml.push_str("                </p:nvSpPr>\n");
            xml.push_str("                <p:spPr/>\n");
            if let Some(paragraphs) = &shape.text_body {
                xml.push_str("                <p:txBody>\n");
                xml.push_str("                    <a:bodyPr/>\n");
                for paragraph in paragraphs {
                    xml.push_str("                    <a:p>\n");
                    for run in &paragraph.runs {
                        let space = if needs_space_preserve(&run.text) {
                            " xml:space=\"preserve\""
                        } else {
                            ""
                        };
                        xml.push_str(&format!(
                            "                        <a:r><a:t{}>{}</a:t></a:r>\n",
                            space,
                            escape(run.text.as_str())
                        ));
                    }
                    xml.push_str("                    </a:p>\n");
                }
                xml.push_str("                </p:txBody>\n");
            }
            xml.push_str("            </p:sp>\n");
        }

        xml.push_str("        </p:spTree>\n");
        xml.push_str("    </p:cSld>\n");
        xml.push_str("</p:sld>");
        xml
    }

    pub fn text_lines(&self) -> Vec<String> {
        self.shapes
            .iter()
            .filter_map(|s| s.text_body.as_ref())
            .flat_map(|paragraphs| paragraphs.iter().map(Paragraph::text))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presentation {
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self { slides }
    }

    pub fn slide_part(position: usize) -> String {
        format!("ppt/slides/slide{}.xml", position + 1)
    }

    pub fn text_lines(&self) -> Vec<String> {
        self.slides.iter().flat_map(Slide::text_lines).collect()
    }

    /// Content types, package and presentation relationships, the
    /// presentation part with its ordered slide id list, then the slides.
    ///
    /// A presentation without slides gets one slide with no shapes.
    pub fn into_part_graph(&self) -> PartGraph {
        let fallback;
        let slides: &[Slide] = if self.slides.is_empty() {
            fallback = [Slide::default()];
            &fallback
        } else {
            &self.slides
        };

        let mut package = OpcPackage::new();
        package.relate(None, rel_types::OFFICE_DOCUMENT, PRESENTATION_PART);

        let slide_rel_ids: Vec<String> = (0..slides.len())
            .map(|position| {
                package.relate(
                    Some(PRESENTATION_PART),
                    rel_types::SLIDE,
                    &Self::slide_part(position),
                )
            })
            .collect();

        package.add_part(
            PRESENTATION_PART,
            PRESENTATION_CONTENT_TYPE,
            presentation_xml(&slide_rel_ids),
        );
        for (position, slide) in slides.iter().enumerate() {
            package.add_part(&Self::slide_part(position), SLIDE_CONTENT_TYPE, slide.to_xml());
        }

        package.into_part_graph()
    }
}

fn presentation_xml(slide_rel_ids: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<p:presentation xmlns:p=\"{PRESENTATION_NS}\" xmlns:r=\"{OFFICE_RELATIONSHIPS_NS}\">\n"
    ));
    xml.push_str("    <p:sldIdLst>\n");
    for (offset, rel_id) in slide_rel_ids.iter().enumerate() {
        xml.push_str(&format!(
            "        <p:sldId id=\"{}\" r:id=\"{}\"/>\n",
            FIRST_SLIDE_ID + offset as u32,
            rel_id
        ));
    }
    xml.push_str("    </p:sldIdLst>\n");
    xml.push_str("</p:presentation>");
    xml
}
