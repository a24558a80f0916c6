//! Attribute ports.
//!
//! A port is a thin, host-facing accessor for one thermostat attribute. It
//! holds no protocol knowledge: reads come from the driver's cached state,
//! writes forward to the matching driver setter. What a port does own is the
//! declared metadata (value kind, writability, range/step/unit) that a host
//! needs to validate input and render controls.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::thermostat::Thermostat;
use crate::transport::Transport;

/// Depth of the pending-write queue a host should allocate per port.
///
/// Commands execute strictly serially on the device, so a deeper queue only
/// delays the inevitable; depth 1 keeps "latest write wins" semantics while
/// an exchange is in flight.
pub const WRITE_QUEUE_LEN: usize = 1;

/// The thermostat attributes exposed as ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Target temperature in °C.
    Temperature,
    /// Manual (fixed temperature) mode.
    Manual,
    /// Boost heating.
    Boost,
    /// Physical child lock. Only exposed on lock-capable configurations.
    Locked,
}

impl Attribute {
    /// Stable identifier used as the port id.
    pub const fn id(self) -> &'static str {
        match self {
            Attribute::Temperature => "temperature",
            Attribute::Manual => "manual",
            Attribute::Boost => "boost",
            Attribute::Locked => "locked",
        }
    }

    /// The declared metadata for this attribute.
    pub const fn spec(self) -> &'static PortSpec {
        const TEMPERATURE: PortSpec = PortSpec {
            id: "temperature",
            kind: ValueKind::Number,
            writable: true,
            min: Some(eq3bt_types::TEMP_MIN),
            max: Some(eq3bt_types::TEMP_MAX),
            step: Some(eq3bt_types::TEMP_STEP),
            unit: Some("°C"),
        };
        const MANUAL: PortSpec = PortSpec::boolean("manual");
        const BOOST: PortSpec = PortSpec::boolean("boost");
        const LOCKED: PortSpec = PortSpec::boolean("locked");

        match self {
            Attribute::Temperature => &TEMPERATURE,
            Attribute::Manual => &MANUAL,
            Attribute::Boost => &BOOST,
            Attribute::Locked => &LOCKED,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The kind of value a port carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    Bool,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Number => f.write_str("number"),
            ValueKind::Bool => f.write_str("boolean"),
        }
    }
}

/// A dynamically typed port value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f32),
    Bool(bool),
}

impl Value {
    /// The kind of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Bool,
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Declared constraints of one port.
///
/// These are metadata for the host, not driver-enforced limits: the driver
/// encodes whatever it is told, the host is expected to validate against
/// `min`/`max`/`step` before writing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortSpec {
    /// Stable port identifier.
    pub id: &'static str,
    /// Kind of value this port carries.
    pub kind: ValueKind,
    /// Whether the host may write the port.
    pub writable: bool,
    /// Lower bound (number ports only).
    pub min: Option<f32>,
    /// Upper bound (number ports only).
    pub max: Option<f32>,
    /// Resolution (number ports only).
    pub step: Option<f32>,
    /// Display unit (number ports only).
    pub unit: Option<&'static str>,
}

impl PortSpec {
    const fn boolean(id: &'static str) -> Self {
        Self {
            id,
            kind: ValueKind::Bool,
            writable: true,
            min: None,
            max: None,
            step: None,
            unit: None,
        }
    }
}

/// A host-facing accessor for one attribute of a shared thermostat.
pub struct Port<T: Transport> {
    thermostat: Arc<Thermostat<T>>,
    attribute: Attribute,
}

impl<T: Transport> fmt::Debug for Port<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("attribute", &self.attribute)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Clone for Port<T> {
    fn clone(&self) -> Self {
        Self {
            thermostat: Arc::clone(&self.thermostat),
            attribute: self.attribute,
        }
    }
}

impl<T: Transport> Port<T> {
    /// Bind a port to one attribute of a shared driver.
    pub fn new(thermostat: Arc<Thermostat<T>>, attribute: Attribute) -> Self {
        Self {
            thermostat,
            attribute,
        }
    }

    /// The attribute this port exposes.
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    /// The declared metadata of this port.
    pub fn spec(&self) -> &'static PortSpec {
        self.attribute.spec()
    }

    /// Read the cached value.
    ///
    /// `None` means the attribute has no known value (the last poll failed or
    /// none has run yet); it is an absence, not an error.
    pub async fn read_value(&self) -> Option<Value> {
        match self.attribute {
            Attribute::Temperature => self.thermostat.temperature().await.map(Value::Number),
            Attribute::Manual => self.thermostat.manual().await.map(Value::Bool),
            Attribute::Boost => self.thermostat.boost().await.map(Value::Bool),
            Attribute::Locked => self.thermostat.locked().await.map(Value::Bool),
        }
    }

    /// Write a value through the driver.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidValue`] when the value kind does not match the port
    /// (nothing is sent in that case); driver and transport errors propagate
    /// unchanged.
    pub async fn write_value(&self, value: Value) -> Result<()> {
        match (self.attribute, value) {
            (Attribute::Temperature, Value::Number(celsius)) => {
                self.thermostat.set_temperature(celsius).await
            }
            (Attribute::Manual, Value::Bool(enabled)) => self.thermostat.set_manual(enabled).await,
            (Attribute::Boost, Value::Bool(enabled)) => self.thermostat.set_boost(enabled).await,
            (Attribute::Locked, Value::Bool(enabled)) => self.thermostat.set_locked(enabled).await,
            (attribute, value) => Err(Error::invalid_value(format!(
                "port '{}' expects a {} value, got {}",
                attribute.id(),
                attribute.spec().kind,
                value.kind()
            ))),
        }
    }
}

impl<T: Transport> Thermostat<T> {
    /// Build the port set for a shared driver.
    ///
    /// Temperature, manual and boost are always present; locked only when the
    /// configuration has a child lock.
    pub fn ports(thermostat: &Arc<Self>) -> Vec<Port<T>> {
        let mut ports = vec![
            Port::new(Arc::clone(thermostat), Attribute::Temperature),
            Port::new(Arc::clone(thermostat), Attribute::Manual),
            Port::new(Arc::clone(thermostat), Attribute::Boost),
        ];
        if thermostat.config().supports_lock {
            ports.push(Port::new(Arc::clone(thermostat), Attribute::Locked));
        }
        ports
    }
}
