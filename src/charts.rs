use ratatui::style::Color;

pub const NAVY_LIGHT: Color = Color::Rgb(0x00, 0x33, 0x66);
pub const ACCENT_LIME: Color = Color::Rgb(0x39, 0xff, 0x14);
pub const GRAY: Color = Color::Rgb(0xaa, 0xaa, 0xaa);

pub const SUBJECT_PALETTE: [Color; 6] = [
    Color::Rgb(0x00, 0x1f, 0x3f),
    Color::Rgb(0x00, 0x33, 0x66),
    Color::Rgb(0x00, 0x4c, 0x99),
    Color::Rgb(0x39, 0xff, 0x14),
    Color::Rgb(0xff, 0xd7, 0x00),
    Color::Rgb(0xaa, 0xaa, 0xaa),
];

/// One colour per slice, wrapping around the palette.
pub fn palette_for(count: usize) -> Vec<Color> {
    SUBJECT_PALETTE.iter().cycle().take(count).copied().collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Pie,
    Bar,
    Doughnut,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartData {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub dataset_label: Option<String>,
    pub values: Vec<u64>,
    pub colors: Vec<Color>,
}

#[derive(Debug)]
pub struct Chart {
    instance: u64,
    canvas: &'static str,
    data: ChartData,
}

impl Chart {
    #[cfg(test)]
    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn data(&self) -> &ChartData {
        &self.data
    }

    fn destroy(self) {
        tracing::debug!(canvas = self.canvas, instance = self.instance, "chart destroyed");
    }
}

/// The single chart a view may hold. Redrawing tears the old chart down
/// before the new one exists.
#[derive(Debug)]
pub struct ChartSlot {
    canvas: &'static str,
    current: Option<Chart>,
    created: u64,
    destroyed: u64,
}

impl ChartSlot {
    pub fn new(canvas: &'static str) -> ChartSlot {
        ChartSlot {
            canvas,
            current: None,
            created: 0,
            destroyed: 0,
        }
    }

    pub fn redraw(&mut self, data: ChartData) -> &Chart {
        if let Some(old) = self.current.take() {
            old.destroy();
            self.destroyed += 1;
            tracing::trace!(canvas = self.canvas, destroyed = self.destroyed, "slot cleared");
        }
        self.created += 1;
        tracing::debug!(canvas = self.canvas, instance = self.created, kind = ?data.kind, "chart created");
        self.current.insert(Chart {
            instance: self.created,
            canvas: self.canvas,
            data,
        })
    }

    pub fn current(&self) -> Option<&Chart> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn live_charts(&self) -> u64 {
        self.created - self.destroyed
    }
}
