use egui::{self, Align2, Color32, Pos2, Rect, RichText, Sense, Shape, Stroke, TextStyle};

/// Palette cycled across series.
pub const SERIES_COLORS: [Color32; 10] = [
    Color32::from_rgb(230, 85, 13),
    Color32::from_rgb(49, 130, 189),
    Color32::from_rgb(49, 163, 84),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(127, 127, 127),
    Color32::from_rgb(188, 189, 34),
    Color32::from_rgb(23, 190, 207),
];

const PADDING_FRACTION: f64 = 0.05;

/// One plotted line.
pub struct Series<'a> {
    pub label: &'a str,
    pub values: &'a [f64],
    pub color: Color32,
}

/// Vertical axis bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Padded bounds over every finite value, `None` when there is nothing to plot.
    pub fn covering<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for values in series {
            for &v in values.iter().filter(|v| v.is_finite()) {
                min = min.min(v);
                max = max.max(v);
            }
        }
        if min > max {
            return None;
        }
        let span = max - min;
        let pad = if span > 0.0 {
            span * PADDING_FRACTION
        } else {
            (min.abs() * PADDING_FRACTION).max(1.0)
        };
        Some(Self {
            min: min - pad,
            max: max + pad,
        })
    }

    /// Position of `value` in `0..=1`, bottom to top.
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Screen position of sample `index` out of `count` (window capacity) inside `rect`.
pub fn point_at(rect: Rect, index: usize, count: usize, value: f64, range: ValueRange) -> Pos2 {
    let x_frac = if count > 1 {
        index as f32 / (count - 1) as f32
    } else {
        0.0
    };
    let y_frac = range.normalize(value) as f32;
    Pos2::new(
        rect.left() + x_frac * rect.width(),
        rect.bottom() - y_frac * rect.height(),
    )
}

/// Draw a titled line chart with a legend. `slots` is the horizontal sample capacity.
pub fn line_chart(ui: &mut egui::Ui, title: &str, series: &[Series<'_>], slots: usize, height: f32) {
    ui.label(RichText::new(title).strong());
    let width = ui.available_width();
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, height), Sense::hover());
    let painter = ui.painter_at(rect);
    let visuals = ui.visuals();
    painter.rect_filled(rect, 2.0, visuals.extreme_bg_color);
    painter.rect_stroke(
        rect,
        2.0,
        visuals.widgets.noninteractive.bg_stroke,
        egui::StrokeKind::Inside,
    );

    let font = TextStyle::Small.resolve(ui.style());
    let text_color = visuals.weak_text_color();
    let Some(range) = ValueRange::covering(series.iter().map(|s| s.values)) else {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "Waiting for data",
            TextStyle::Heading.resolve(ui.style()),
            text_color,
        );
        return;
    };
    let plot = rect.shrink(4.0);
    for s in series {
        let points: Vec<Pos2> = s
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| point_at(plot, i, slots, v, range))
            .collect();
        if points.len() > 1 {
            painter.add(Shape::line(points, Stroke::new(1.5, s.color)));
        }
    }
    painter.text(
        rect.left_top() + egui::vec2(4.0, 2.0),
        Align2::LEFT_TOP,
        format_axis(range.max),
        font.clone(),
        text_color,
    );
    painter.text(
        rect.left_bottom() + egui::vec2(4.0, -2.0),
        Align2::LEFT_BOTTOM,
        format_axis(range.min),
        font,
        text_color,
    );

    ui.horizontal_wrapped(|ui| {
        for s in series {
            ui.label(RichText::new("■").color(s.color));
            ui.label(RichText::new(s.label).small());
        }
    });
}

/// Compact axis label: integers above 1000, two decimals below.
pub fn format_axis(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
