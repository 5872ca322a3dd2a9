//! Payload shapes shared by several definition families

use std::collections::BTreeMap;
use std::io::{self, Cursor};

use crate::ioutils::ReadInt;

/// A parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Integer parameter
    Int(i32),
    /// String parameter
    Str(String),
}

/// Key/value parameters attached by opcode 249
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params(BTreeMap<u32, ParamValue>);

impl Params {
    /// Read `u8 n`, then `n x (u8 is_string, u24 key, str | i32)`
    ///
    /// Values are merged into the existing map.
    pub fn read_into(&mut self, buf: &mut Cursor<&[u8]>) -> io::Result<()> {
        let count = buf.read_u8()?;
        for _ in 0..count {
            let is_string = buf.read_u8()? == 1;
            let key = buf.read_u24be()?;
            let value = if is_string {
                ParamValue::Str(buf.read_cstring()?)
            } else {
                ParamValue::Int(buf.read_i32be()?)
            };
            self.0.insert(key, value);
        }
        Ok(())
    }

    /// Value for a key
    pub fn get(&self, key: u32) -> Option<&ParamValue> {
        self.0.get(&key)
    }

    /// Integer value for a key
    pub fn int(&self, key: u32) -> Option<i32> {
        match self.get(key)? {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Str(_) => None,
        }
    }

    /// String value for a key
    pub fn str(&self, key: u32) -> Option<&str> {
        match self.get(key)? {
            ParamValue::Str(s) => Some(s),
            ParamValue::Int(_) => None,
        }
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Variable-driven appearance switch for NPCs and locations
///
/// The displayed id is `ids[value]` where `value` comes from the varbit
/// or varp; out-of-range values use `default` (or the last id when
/// there is no explicit default).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transforms {
    /// Controlling varbit
    pub varbit: Option<u16>,
    /// Controlling varp
    pub varp: Option<u16>,
    /// Explicit fallback id
    pub default: Option<u16>,
    /// Ids selected by value
    pub ids: Vec<Option<u16>>,
}

impl Transforms {
    /// Read the plain form: `u16? varbit, u16? varp, u8 n, (n + 1) x u16?`
    pub fn read(buf: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Self::read_inner(buf, false)
    }

    /// Read the form with an explicit default before the count
    pub fn read_with_default(buf: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Self::read_inner(buf, true)
    }

    fn read_inner(buf: &mut Cursor<&[u8]>, has_default: bool) -> io::Result<Self> {
        let varbit = buf.read_u16_opt()?;
        let varp = buf.read_u16_opt()?;
        let default = if has_default { buf.read_u16_opt()? } else { None };
        let count = usize::from(buf.read_u8()?);
        let ids = (0..=count)
            .map(|_| buf.read_u16_opt())
            .collect::<io::Result<_>>()?;
        Ok(Self {
            varbit,
            varp,
            default,
            ids,
        })
    }

    /// Id shown for a variable value
    pub fn resolve(&self, value: i32) -> Option<u16> {
        let selected = usize::try_from(value)
            .ok()
            .and_then(|i| self.ids.get(i).copied());
        match selected {
            Some(id) => id,
            None => self.default.or_else(|| self.ids.last().copied().flatten()),
        }
    }
}
