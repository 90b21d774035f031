use crate::command::WORD_LEN;

/// Quantities reported by the read mass and number concentrations command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Field {
    /// Number Concentration PM0.5 [#/cm³] [×10]
    #[cfg_attr(feature = "serde", serde(rename = "pm_0_5_number"))]
    Pm0_5Number,
    /// Number Concentration PM1.0 [#/cm³] [×10]
    #[cfg_attr(feature = "serde", serde(rename = "pm_1_0_number"))]
    Pm1_0Number,
    /// Number Concentration PM2.5 [#/cm³] [×10]
    #[cfg_attr(feature = "serde", serde(rename = "pm_2_5_number"))]
    Pm2_5Number,
    /// Number Concentration PM4.0 [#/cm³] [×10]
    #[cfg_attr(feature = "serde", serde(rename = "pm_4_0_number"))]
    Pm4_0Number,
    /// Number Concentration PM10.0 [#/cm³] [×10]
    #[cfg_attr(feature = "serde", serde(rename = "pm_10_0_number"))]
    Pm10_0Number,
    /// Typical Particle Size [μm] [×1000]
    TypicalParticleSize,
}

impl Field {
    pub const COUNT: usize = 6;

    pub const ALL: [Field; Field::COUNT] = [
        Field::Pm0_5Number,
        Field::Pm1_0Number,
        Field::Pm2_5Number,
        Field::Pm4_0Number,
        Field::Pm10_0Number,
        Field::TypicalParticleSize,
    ];

    /// Position in the slot table and in [`Field::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Position of the field's word in the response. Words 0..4 carry the
    /// mass concentrations, which this driver does not publish.
    pub const fn word_index(self) -> usize {
        4 + self as usize
    }

    /// Bytes that have to be read for this field's word to be included.
    pub const fn frame_len(self) -> usize {
        (self.word_index() + 1) * WORD_LEN
    }

    /// Fixed-point divisor of the raw word.
    pub const fn scale(self) -> f32 {
        match self {
            Field::TypicalParticleSize => 1000.0,
            _ => 10.0,
        }
    }

    /// Factor applied when publishing, turning the sensor's #/cm³ into #/m³.
    pub const fn publish_factor(self) -> f32 {
        match self {
            Field::TypicalParticleSize => 1.0,
            _ => 1_000_000.0,
        }
    }

    /// Name of the output binding in the host configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Field::Pm0_5Number => "pm_0_5_number",
            Field::Pm1_0Number => "pm_1_0_number",
            Field::Pm2_5Number => "pm_2_5_number",
            Field::Pm4_0Number => "pm_4_0_number",
            Field::Pm10_0Number => "pm_10_0_number",
            Field::TypicalParticleSize => "typical_particle_size",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Converts a raw word into the field's physical value.
    pub fn decode(self, raw: u16) -> Measurement {
        if raw == SENTINEL {
            Measurement::Unavailable
        } else {
            Measurement::Available(raw as f32 / self.scale())
        }
    }

    /// Inverse of [`Field::decode`], rounding to the nearest representable
    /// value and saturating below the sentinel.
    pub fn encode(self, measurement: Measurement) -> u16 {
        match measurement {
            Measurement::Unavailable => SENTINEL,
            Measurement::Available(value) => {
                let scaled = value * self.scale() + 0.5;
                if scaled <= 0.0 {
                    0
                } else if scaled >= (SENTINEL - 1) as f32 {
                    SENTINEL - 1
                } else {
                    scaled as u16
                }
            }
        }
    }
}

/// Word value the sensor reports when a quantity is not available.
pub const SENTINEL: u16 = 0xFFFF;

/// Set of requested fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSet(u8);

impl FieldSet {
    pub const fn empty() -> Self {
        FieldSet(0)
    }

    pub const fn all() -> Self {
        FieldSet((1 << Field::COUNT) - 1)
    }

    pub const fn with(self, field: Field) -> Self {
        FieldSet(self.0 | 1 << field.index())
    }

    pub fn insert(&mut self, field: Field) {
        *self = self.with(field);
    }

    pub const fn contains(self, field: Field) -> bool {
        self.0 & (1 << field.index()) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Field> {
        Field::ALL.into_iter().filter(move |field| self.contains(*field))
    }

    /// Response length covering the highest requested word, zero if empty.
    pub fn frame_len(self) -> usize {
        self.iter().map(Field::frame_len).max().unwrap_or(0)
    }
}

impl FromIterator<Field> for FieldSet {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        iter.into_iter().fold(FieldSet::empty(), FieldSet::with)
    }
}

/// Serialized as the list of binding names.
#[cfg(feature = "serde")]
impl serde::Serialize for FieldSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for FieldSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldSetVisitor;

        impl<'de> serde::de::Visitor<'de> for FieldSetVisitor {
            type Value = FieldSet;

            fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("a list of field names")
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<FieldSet, A::Error> {
                let mut set = FieldSet::empty();
                while let Some(field) = seq.next_element::<Field>()? {
                    set.insert(field);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(FieldSetVisitor)
    }
}

/// A decoded quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Measurement {
    Available(f32),
    /// The sensor reported the sentinel word.
    Unavailable,
}

impl Measurement {
    pub fn value(self) -> Option<f32> {
        match self {
            Measurement::Available(value) => Some(value),
            Measurement::Unavailable => None,
        }
    }
}

/// SEN5x number concentration data, in the sensor's units.
///
/// A field is `None` when it was not requested.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcentrationReading {
    values: [Option<Measurement>; Field::COUNT],
}

impl ConcentrationReading {
    pub fn get(&self, field: Field) -> Option<Measurement> {
        self.values[field.index()]
    }

    pub(crate) fn set(&mut self, field: Field, measurement: Measurement) {
        self.values[field.index()] = Some(measurement);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, Measurement)> + '_ {
        Field::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|m| (field, m)))
    }

    /// Number Concentration PM0.5 [#/cm³]
    pub fn pm0_5_number(&self) -> Option<Measurement> {
        self.get(Field::Pm0_5Number)
    }

    /// Number Concentration PM1.0 [#/cm³]
    pub fn pm1_0_number(&self) -> Option<Measurement> {
        self.get(Field::Pm1_0Number)
    }

    /// Number Concentration PM2.5 [#/cm³]
    pub fn pm2_5_number(&self) -> Option<Measurement> {
        self.get(Field::Pm2_5Number)
    }

    /// Number Concentration PM4.0 [#/cm³]
    pub fn pm4_0_number(&self) -> Option<Measurement> {
        self.get(Field::Pm4_0Number)
    }

    /// Number Concentration PM10.0 [#/cm³]
    pub fn pm10_0_number(&self) -> Option<Measurement> {
        self.get(Field::Pm10_0Number)
    }

    /// Typical Particle Size [μm]
    pub fn typical_particle_size(&self) -> Option<Measurement> {
        self.get(Field::TypicalParticleSize)
    }
}
