/// Linear axis with tick generation and data→pixel mapping.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub label: String,
    pub tick_positions: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub minor_ticks: Vec<f64>,
}

impl Axis {
    /// Linear axis spanning exactly `[min, max]` with nice ticks inside it.
    pub fn ranged(min: f64, max: f64, target_ticks: usize) -> Self {
        let (min, max) = if max > min { (min, max) } else { (min - 1.0, min + 1.0) };
        let (_, _, step) = nice_range(min, max, target_ticks);
        let minor_step = step / 5.0;
        let eps = step * 1e-6;
        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        let mut minor = Vec::new();
        let first = (min / minor_step).ceil() as i64;
        let last = (max / minor_step).floor() as i64;
        for k in first..=last {
            let v = k as f64 * minor_step;
            if k.rem_euclid(5) == 0 {
                let v = if v.abs() < eps { 0.0 } else { v };
                ticks.push(v);
                labels.push(format_tick(v, step));
            } else {
                minor.push(v);
            }
        }
        Self {
            min,
            max,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    /// Axis over `bin_edges` with one tick per bin centre; empty labels leave
    /// the tick unlabelled.
    pub fn with_custom_labels(bin_edges: &[f64], labels: &[String]) -> Self {
        let min = bin_edges.first().copied().unwrap_or(0.0);
        let max = bin_edges.last().copied().unwrap_or(1.0);
        let centres: Vec<f64> = bin_edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();
        let tick_labels =
            (0..centres.len()).map(|i| labels.get(i).cloned().unwrap_or_default()).collect();
        Self {
            min,
            max: if max > min { max } else { min + 1.0 },
            label: String::new(),
            tick_positions: centres,
            tick_labels,
            minor_ticks: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Map a data value to pixel coordinate.
    pub fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let frac = (value - self.min) / (self.max - self.min);
        px_min + frac * (px_max - px_min)
    }
}

/// "Nice numbers" algorithm for pleasant tick spacing.
fn nice_range(data_min: f64, data_max: f64, target_ticks: usize) -> (f64, f64, f64) {
    if (data_max - data_min).abs() < 1e-15 {
        return (data_min - 1.0, data_max + 1.0, 1.0);
    }
    let range = data_max - data_min;
    let rough_step = range / (target_ticks.max(2) - 1) as f64;
    let step = nice_step(rough_step);
    let nice_min = (data_min / step).floor() * step;
    let nice_max = (data_max / step).ceil() * step;
    (nice_min, nice_max, step)
}

fn nice_step(rough: f64) -> f64 {
    if !(rough.is_finite() && rough > 0.0) {
        return 1.0;
    }
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice_frac = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice_frac * 10.0_f64.powf(exp)
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()) as usize };
    if decimals == 0 {
        // Avoid "-0"
        let v = if value.abs() < step * 0.01 { 0.0 } else { value };
        format!("{}", v as i64)
    } else {
        format!("{:.prec$}", value, prec = decimals)
    }
}
