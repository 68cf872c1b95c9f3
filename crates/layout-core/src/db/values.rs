//! Conversions between model fields and libSQL values

use libsql::Value;

use crate::models::MachineRef;

pub fn machine_to_value(machine: Option<&MachineRef>) -> Value {
    match machine {
        Some(MachineRef::Number(number)) => Value::Integer(*number),
        Some(MachineRef::Text(text)) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

pub fn value_to_machine(value: Value) -> Option<MachineRef> {
    match value {
        Value::Integer(number) => Some(MachineRef::Number(number)),
        Value::Text(text) => Some(MachineRef::Text(text)),
        Value::Real(real) => Some(MachineRef::Text(real.to_string())),
        Value::Null | Value::Blob(_) => None,
    }
}

pub fn text_to_value(text: Option<&str>) -> Value {
    text.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

pub fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Text(text) => Some(text),
        Value::Integer(number) => Some(number.to_string()),
        Value::Real(real) => Some(real.to_string()),
        Value::Null | Value::Blob(_) => None,
    }
}
