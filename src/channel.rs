//! Voltage channels as data
//!
//! The solver identifies electrodes by a small positive integer written into
//! the geometry file. Each trap family carries its own channel set; the set
//! also holds display metadata and the default fast-adjust voltage for each
//! channel.

pub const EXCITATION: u8 = 1;
pub const DETECTION: u8 = 2;
pub const TRAPPING: u8 = 3;
pub const COMPENSATED: u8 = 4;

/// One voltage channel with its display and adjust metadata.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Channel {
    pub id: u8,
    pub label: String,
    pub color: String,
    /// Voltage applied by the solver's fast-adjust step unless overridden.
    pub default_voltage: f64,
}

/// The channel enumeration of one trap family.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChannelSet {
    channels: Vec<Channel>,
}

impl ChannelSet {
    /// Two channels: driven excitation, grounded detection.
    pub fn simple() -> Self {
        Self {
            channels: vec![
                channel(EXCITATION, "Excitation electrode", "green", 1.0),
                channel(DETECTION, "Detection electrode", "blue", 0.0),
            ],
        }
    }

    /// Sector electrodes grounded, endcaps driven.
    pub fn trapped() -> Self {
        Self {
            channels: vec![
                channel(EXCITATION, "Excitation electrode", "green", 0.0),
                channel(DETECTION, "Detection electrode", "blue", 0.0),
                channel(TRAPPING, "Trapping electrode", "red", 1.0),
            ],
        }
    }

    /// Trapped set plus one compensation channel.
    pub fn compensated() -> Self {
        let mut set = Self::trapped();
        set.channels
            .push(channel(COMPENSATED, "Compensated electrode", "yellow", 2.0));
        set
    }

    /// Ring-stack builder: `trapping` trapping rings followed by
    /// `compensated` compensation rings, ids assigned sequentially after the
    /// two sector channels. Multi-ring variants (infinity cells, stacked
    /// compensation) get their enumeration from here instead of a bespoke
    /// type.
    pub fn with_rings(trapping: usize, compensated: usize) -> Self {
        let mut channels = vec![
            channel(EXCITATION, "Excitation electrode", "green", 0.0),
            channel(DETECTION, "Detection electrode", "blue", 0.0),
        ];
        let mut id = DETECTION;
        for n in 0..trapping {
            id += 1;
            channels.push(channel(id, &format!("Trapping ring {n}"), "red", 1.0));
        }
        for n in 0..compensated {
            id += 1;
            channels.push(channel(id, &format!("Compensation ring {n}"), "yellow", 0.0));
        }
        Self { channels }
    }

    pub fn get(&self, id: u8) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// The comma-joined `id=voltage` list consumed by the solver's
    /// fast-adjust step. `rule` may override the default for any channel.
    pub fn adjust_assignments<F>(&self, rule: F) -> String
    where
        F: Fn(u8) -> Option<f64>,
    {
        self.channels
            .iter()
            .map(|c| {
                let v = rule(c.id).unwrap_or(c.default_voltage);
                format!("{}={}", c.id, v)
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn channel(id: u8, label: &str, color: &str, default_voltage: f64) -> Channel {
    Channel {
        id,
        label: label.to_string(),
        color: color.to_string(),
        default_voltage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn trapped_set_defaults() {
        let set = ChannelSet::trapped();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(TRAPPING).unwrap().default_voltage, 1.0);
        assert_eq!(set.get(EXCITATION).unwrap().default_voltage, 0.0);
        assert!(set.get(COMPENSATED).is_none());
    }

    #[test]
    fn ring_builder_assigns_sequential_ids() {
        let set = ChannelSet::with_rings(4, 2);
        assert_eq!(set.len(), 8);
        assert_eq!(set.get(3).unwrap().label, "Trapping ring 0");
        assert_eq!(set.get(6).unwrap().label, "Trapping ring 3");
        assert_eq!(set.get(7).unwrap().label, "Compensation ring 0");
        assert_eq!(set.get(8).unwrap().color, "yellow");
    }

    #[test]
    fn adjust_string_applies_overrides() {
        let set = ChannelSet::trapped();
        let s = set.adjust_assignments(|id| (id == TRAPPING).then_some(1.2));
        assert_eq!(s, "1=0,2=0,3=1.2");
    }
}
