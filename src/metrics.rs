// Derived metrics: unit conversions, science-theme roll-ups, cumulative
// archive fraction. Pure functions over aggregated rows, no I/O.

use std::fmt;

const TB: f64 = 1_000_000_000_000.0;
const PB: f64 = 1_000_000_000_000_000.0;

/// Decimal (1000-based) conversion; NULL sums from the database count as 0.
/// The decimal divisor is fixed so figures stay comparable across reports.
pub fn bytes_to_terabytes(bytes: Option<i64>) -> f64 {
    match bytes {
        Some(b) => b as f64 / TB,
        None => 0.0,
    }
}

pub fn bytes_to_petabytes(bytes: Option<i64>) -> f64 {
    match bytes {
        Some(b) => b as f64 / PB,
        None => 0.0,
    }
}

pub fn terabytes_to_bytes(tb: f64) -> f64 {
    tb * TB
}

/// Science working-group themes used for the categorical roll-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScienceCategory {
    Eor,
    Shi,
    Geg,
    Transients,
    PulsarsFt,
    Calibration,
    Misc,
}

pub const ALL_CATEGORIES: [ScienceCategory; 7] = [
    ScienceCategory::Eor,
    ScienceCategory::Shi,
    ScienceCategory::Geg,
    ScienceCategory::Transients,
    ScienceCategory::PulsarsFt,
    ScienceCategory::Calibration,
    ScienceCategory::Misc,
];

impl ScienceCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ScienceCategory::Eor => "EoR",
            ScienceCategory::Shi => "SHI",
            ScienceCategory::Geg => "GEG",
            ScienceCategory::Transients => "Transients",
            ScienceCategory::PulsarsFt => "Pulsars and FT",
            ScienceCategory::Calibration => "Calibration",
            ScienceCategory::Misc => "Misc",
        }
    }
}

impl fmt::Display for ScienceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Static project-description -> theme table. Known to be incomplete;
/// unmapped projects are excluded from category totals and surfaced via the
/// coverage fraction instead of being hidden.
pub fn science_category(description: &str) -> Option<ScienceCategory> {
    use ScienceCategory::*;
    let cat = match description.trim() {
        "Sun Drifts" | "Solar Observations" => Shi,
        "GLEAM"
        | "Synchrotron Cosmic Web"
        | "MIDAS"
        | "HIghZ: A search for HI absorption in high-redshift radio galaxies"
        | "MWA targeted campaign of nearby, flaring M dwarf stars"
        | "MAGE\u{ad}\u{2010}X: A Deep Survey of the Magellanic System"
        | "Cosmic web observation"
        | "Detecting Molecular Lines with the MWA"
        | "MWA KAT-7 clusters"
        | "MWA diffuse cluster emission"
        | "Proxima Centauri"
        | "RRLs in GC and NGC6334"
        | "Nearby Low-Luminosity QSOs" => Geg,
        "EoR" | "Global EoR with the moon" | "EoR SKA Fields" => Eor,
        "Calibration" => Calibration,
        "FRBs with the MWA"
        | "Shadowing Parkes FRB observations"
        | "MWA pulsar survey"
        | "Low-freq investigations of Parkes pta MSP"
        | "Voltage capture testing"
        | "Intermediate dispersion pulsar scattering"
        | "FAST pulsar candidate"
        | "Orbital dynamics of PSR J1145-6545"
        | "Dispersion variation in J2241-5236"
        | "Space Situational Awareness (VCS)"
        | "Radio pules from the Geminga Pulsar" => PulsarsFt,
        "IPS survey"
        | "IPS"
        | "The MWA long-term radio sky monitor"
        | "Follow up observations of UV Ceti"
        | "Monitoring the Galaxy"
        | "IPS observations for SKA calibration analysis"
        | "Searching for pulsars in the image domain: pilot study" => Transients,
        "Unspecified Director's time"
        | "AAVS0.5 tests"
        | "Default"
        | "Instrument Verification Program" => Misc,
        _ => return None,
    };
    Some(cat)
}

#[derive(Debug, Clone)]
pub struct CategoryBreakdown {
    /// (category, total volume) in ALL_CATEGORIES order.
    pub totals: Vec<(ScienceCategory, f64)>,
    /// Fraction of the total volume captured by mapped projects.
    pub coverage: f64,
}

/// Roll (description, volume) rows up into theme totals. Unmapped rows are
/// excluded from every theme; their share shows up as 1.0 - coverage.
pub fn categorize_projects(rows: &[(String, f64)]) -> CategoryBreakdown {
    let mut totals: Vec<(ScienceCategory, f64)> =
        ALL_CATEGORIES.iter().map(|c| (*c, 0.0)).collect();
    let mut mapped = 0.0;
    let mut grand_total = 0.0;

    for (description, volume) in rows {
        grand_total += volume;
        if let Some(cat) = science_category(description) {
            mapped += volume;
            let entry = totals.iter_mut().find(|(c, _)| *c == cat).unwrap();
            entry.1 += volume;
        }
    }

    let coverage = if grand_total > 0.0 {
        mapped / grand_total
    } else {
        0.0
    };
    CategoryBreakdown { totals, coverage }
}

/// cumulative_fraction[i] = sum(volumes[0..=i]) / sum(all volumes), for
/// volumes sorted descending. Monotonically non-decreasing, ends at 1.0.
pub fn cumulative_fraction(volumes: &[f64]) -> Vec<f64> {
    let total: f64 = volumes.iter().sum();
    if total <= 0.0 {
        return vec![0.0; volumes.len()];
    }
    let mut out = Vec::with_capacity(volumes.len());
    let mut running = 0.0;
    for v in volumes {
        running += v;
        out.push(running / total);
    }
    out
}
