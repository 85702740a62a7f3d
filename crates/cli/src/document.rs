//! JSON page descriptions in, reconstructed cells out.

use std::io::Write;

use anyhow::{Context, Result};
use cellfill_core::geometry::{Rect, Ruling};
use cellfill_core::grid::CellText;
use cellfill_core::page::{PageContent, TextFragment};
use serde::{Deserialize, Serialize};

/// One page as read from disk.
#[derive(Debug, Clone, Deserialize)]
pub struct PageInput {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub language: Option<String>,
    /// `[y, x0, x1]`
    #[serde(default)]
    pub horizontal: Vec<[f64; 3]>,
    /// `[x, y0, y1]`
    #[serde(default)]
    pub vertical: Vec<[f64; 3]>,
    #[serde(default)]
    pub text: Vec<TextInput>,
    /// `[left, top, width, height]`; the whole page when empty.
    #[serde(default)]
    pub regions: Vec<[f64; 4]>,
    #[serde(default)]
    pub seeds: Vec<[f64; 4]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextInput {
    pub bbox: [f64; 4],
    pub text: String,
}

fn rect([left, top, width, height]: [f64; 4]) -> Rect {
    Rect::new(left, top, width, height)
}

impl PageInput {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid page description")
    }

    /// Build the in-memory page, with `language` overriding the file's.
    pub fn to_page(&self, language: Option<&str>) -> Result<PageContent> {
        let rulings = self
            .horizontal
            .iter()
            .map(|&[y, x0, x1]| Ruling::horizontal(y, x0, x1))
            .chain(self.vertical.iter().map(|&[x, y0, y1]| Ruling::vertical(x, y0, y1)))
            .collect();
        let text = self
            .text
            .iter()
            .map(|t| TextFragment::new(rect(t.bbox), t.text.clone()))
            .collect();
        let page = PageContent::new(Rect::new(0.0, 0.0, self.width, self.height), rulings, text)
            .context("invalid page geometry")?;
        Ok(match language.or(self.language.as_deref()) {
            Some(code) => page.with_language(code),
            None => page,
        })
    }

    pub fn regions(&self) -> Vec<Rect> {
        if self.regions.is_empty() {
            vec![Rect::new(0.0, 0.0, self.width, self.height)]
        } else {
            self.regions.iter().copied().map(rect).collect()
        }
    }

    pub fn seeds(&self) -> Vec<Rect> {
        self.seeds.iter().copied().map(rect).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellOutput {
    pub bbox: [f64; 4],
    pub provenance: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionOutput {
    pub region: [f64; 4],
    pub cells: Vec<CellOutput>,
}

fn bbox(r: &Rect) -> [f64; 4] {
    [r.left, r.top, r.width, r.height]
}

impl RegionOutput {
    pub fn new(region: &Rect, cells: &[CellText]) -> Self {
        Self {
            region: bbox(region),
            cells: cells
                .iter()
                .map(|c| CellOutput {
                    bbox: bbox(&c.cell.rect),
                    provenance: c.cell.provenance.as_str(),
                    text: c.text.clone(),
                })
                .collect(),
        }
    }
}

pub fn write_json<W: Write>(out: &mut W, regions: &[RegionOutput]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, regions).context("failed to write JSON")?;
    writeln!(out)?;
    Ok(())
}

/// One line per cell: region index, bounding box, provenance, escaped text.
pub fn write_text<W: Write>(out: &mut W, regions: &[RegionOutput]) -> Result<()> {
    for (idx, region) in regions.iter().enumerate() {
        for cell in &region.cells {
            let [l, t, w, h] = cell.bbox;
            writeln!(
                out,
                "{idx}\t{l:.2}\t{t:.2}\t{w:.2}\t{h:.2}\t{}\t{}",
                cell.provenance,
                cell.text.replace('\n', "\\n")
            )?;
        }
    }
    Ok(())
}
