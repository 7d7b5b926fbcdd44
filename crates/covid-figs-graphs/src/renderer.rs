//! Chart rendering trait and shared styling.

use crate::layout;
use covid_figs_common::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::debug;

/// Fonts and colors shared by every chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub font_family: String,
    pub super_title_size: u32,
    pub title_size: u32,
    pub label_size: u32,
    pub line_width: u32,
    pub palette: Vec<RGBColor>,
    pub reference_color: RGBColor,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            super_title_size: 32,
            title_size: 22,
            label_size: 15,
            line_width: 2,
            palette: vec![
                RGBColor(31, 119, 180),  // Blue
                RGBColor(255, 127, 14),  // Orange
                RGBColor(44, 160, 44),   // Green
                RGBColor(148, 103, 189), // Purple
            ],
            reference_color: RGBColor(214, 39, 40),
        }
    }
}

impl ChartStyle {
    /// Palette color `index`, cycling.
    pub fn color(&self, index: usize) -> RGBColor {
        if self.palette.is_empty() {
            return BLACK;
        }
        self.palette[index % self.palette.len()]
    }

    pub(crate) fn label_font(&self) -> TextStyle<'_> {
        TextStyle::from((self.font_family.as_str(), self.label_size))
    }
}

/// Something drawable onto any plotters backend.
pub trait ChartRenderer {
    /// Draw into `area`, which the caller has already filled.
    fn draw_on<DB>(&self, area: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static;

    /// Render to a PNG file of `size` pixels.
    fn render_to_file(&self, path: &Path, size: (u32, u32)) -> Result<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        self.draw_on(&root)?;
        root.present()?;
        debug!("Rendered {}x{} chart to {}", size.0, size.1, path.display());
        Ok(())
    }
}

/// Draw centered title lines at the top of `area` and return the area below them.
pub(crate) fn split_title<DB>(
    area: &DrawingArea<DB, Shift>,
    lines: &[String],
    font_size: u32,
    style: &ChartStyle,
) -> Result<DrawingArea<DB, Shift>>
where
    DB: DrawingBackend,
    DB::ErrorType: std::error::Error + Send + Sync + 'static,
{
    let (width, _) = area.dim_in_pixel();
    let line_height = layout::title_line_height(font_size);
    let height = layout::title_block_height(font_size, lines.len());
    let (title, body) = area.split_vertically(height as i32);

    let text_style = TextStyle::from((style.font_family.as_str(), font_size))
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    for (i, line) in lines.iter().enumerate() {
        let y = layout::TITLE_PADDING + line_height * i as u32;
        title.draw_text(line, &text_style, ((width / 2) as i32, y as i32))?;
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        let style = ChartStyle::default();
        assert_eq!(style.color(0), style.color(style.palette.len()));

        let empty = ChartStyle {
            palette: Vec::new(),
            ..ChartStyle::default()
        };
        assert_eq!(empty.color(3), BLACK);
    }
}
