//! Per-class counts and the imbalance advisory.

use std::fmt;

use super::ClassRegistry;

/// Advisory threshold on `max / min` class counts.
pub const IMBALANCE_RATIO_LIMIT: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassCount {
    pub id: usize,
    pub name: String,
    pub count: usize,
    pub percent: f32,
}

/// Class distribution of a loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub classes: Vec<ClassCount>,
    pub total: usize,
}

impl DatasetSummary {
    /// Count labels; classes with no samples are left out.
    pub fn from_labels(labels: &[usize], registry: &ClassRegistry) -> Self {
        let n = labels.iter().copied().max().map(|m| m + 1).unwrap_or(0);
        let mut counts = vec![0usize; n];
        for &label in labels {
            counts[label] += 1;
        }
        let total = labels.len();
        let classes = counts
            .into_iter()
            .enumerate()
            .filter(|(_, count)| *count > 0)
            .map(|(id, count)| ClassCount {
                id,
                name: registry.name(id).into_owned(),
                count,
                percent: count as f32 / total as f32 * 100.0,
            })
            .collect();
        Self { classes, total }
    }

    /// `max / min` over present classes.
    pub fn imbalance_ratio(&self) -> Option<f32> {
        let max = self.classes.iter().map(|c| c.count).max()?;
        let min = self.classes.iter().map(|c| c.count).min()?;
        (min > 0).then(|| max as f32 / min as f32)
    }

    /// The ratio, when it exceeds [`IMBALANCE_RATIO_LIMIT`].
    pub fn imbalance_advisory(&self) -> Option<f32> {
        self.imbalance_ratio()
            .filter(|ratio| *ratio > IMBALANCE_RATIO_LIMIT)
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<15} {:>10} {:>12}", "Class", "Samples", "Percentage")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for class in &self.classes {
            writeln!(
                f,
                "{:<15} {:>10} {:>11.1}%",
                class.name, class.count, class.percent
            )?;
        }
        writeln!(f, "{}", "-".repeat(40))?;
        write!(f, "{:<15} {:>10}", "TOTAL", self.total)
    }
}
