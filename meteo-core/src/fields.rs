//! Field-level JSON readers that never fail.
//!
//! Every read takes a default which is returned when the field is missing,
//! out of range, or of the wrong type.

use serde_json::{Map, Value};

/// A scalar that can be pulled out of a JSON value.
pub trait FieldValue: Sized {
    fn from_json(value: &Value) -> Option<Self>;
}

impl FieldValue for f64 {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FieldValue for i32 {
    // Integral fields are sometimes reported as floats (pressure, visibility).
    fn from_json(value: &Value) -> Option<Self> {
        if let Some(i) = value.as_i64() {
            return i32::try_from(i).ok();
        }
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= i32::MIN as f64 && *f <= i32::MAX as f64)
            .map(|f| f as i32)
    }
}

impl FieldValue for String {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

/// Read `value` as `T`, falling back to `default`.
pub fn read<T: FieldValue>(value: Option<&Value>, default: T) -> T {
    value.and_then(T::from_json).unwrap_or(default)
}

/// An optional JSON object; a missing or non-object node reads as empty.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a>(Option<&'a Map<String, Value>>);

impl<'a> Section<'a> {
    pub fn root(doc: &'a Value) -> Self {
        Section(doc.as_object())
    }

    pub fn section(&self, key: &str) -> Section<'a> {
        Section(self.get(key).and_then(Value::as_object))
    }

    pub fn series(&self, key: &str) -> Series<'a> {
        Series(self.get(key).and_then(Value::as_array).map(Vec::as_slice))
    }

    pub fn read<T: FieldValue>(&self, key: &str, default: T) -> T {
        read(self.get(key), default)
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.and_then(|m| m.get(key))
    }
}

/// An optional JSON array; indexes past the end read as absent.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a>(Option<&'a [Value]>);

impl<'a> Series<'a> {
    pub fn len(&self) -> usize {
        self.0.map_or(0, <[Value]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn at<T: FieldValue>(&self, index: usize, default: T) -> T {
        read(self.0.and_then(|items| items.get(index)), default)
    }

    pub fn str_at(&self, index: usize) -> &'a str {
        self.0
            .and_then(|items| items.get(index))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}
