use crate::{
    error::ConfigurationError,
    types::{Field, FieldSet},
};

/// Downstream consumer of a published value.
pub trait Sensor {
    fn publish(&mut self, value: f32);
}

impl<S: Sensor + ?Sized> Sensor for &mut S {
    fn publish(&mut self, value: f32) {
        (**self).publish(value)
    }
}

/// Fixed table of output bindings, one optional slot per [`Field`].
///
/// Slots are bound once while configuring and are then only invoked by the
/// driver's publishing step.
#[derive(Debug)]
pub struct SensorSlots<S> {
    slots: [Option<S>; Field::COUNT],
}

impl<S> Default for SensorSlots<S> {
    fn default() -> Self {
        Self {
            slots: [None, None, None, None, None, None],
        }
    }
}

impl<S> SensorSlots<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `sensor` to `field`. A slot can only be bound once.
    pub fn bind(&mut self, field: Field, sensor: S) -> Result<(), ConfigurationError> {
        let slot = &mut self.slots[field.index()];
        if slot.is_some() {
            return Err(ConfigurationError::SlotAlreadyBound(field));
        }
        *slot = Some(sensor);
        Ok(())
    }

    pub fn with(mut self, field: Field, sensor: S) -> Result<Self, ConfigurationError> {
        self.bind(field, sensor)?;
        Ok(self)
    }

    pub fn is_bound(&self, field: Field) -> bool {
        self.slots[field.index()].is_some()
    }

    pub fn get(&self, field: Field) -> Option<&S> {
        self.slots[field.index()].as_ref()
    }

    pub(crate) fn get_mut(&mut self, field: Field) -> Option<&mut S> {
        self.slots[field.index()].as_mut()
    }

    /// Fields with a bound slot.
    pub fn fields(&self) -> FieldSet {
        Field::ALL
            .into_iter()
            .filter(|field| self.is_bound(*field))
            .collect()
    }
}
