//! Integer and string helpers for big-endian cache streams

use std::io::{Error, ErrorKind, Read, Write};

use jagstore_crypto::charset;

/// Sentinel a `u16` field uses for "absent"
pub const U16_NONE: u16 = u16::MAX;

/// Generic trait for reading integer types from a buffer.
pub trait ReadInt {
    /// Error type which can be returned on read failures.
    type Error;

    /// Read a `u8` from the buffer.
    fn read_u8(&mut self) -> Result<u8, Self::Error>;

    /// Read an `i8` from the buffer.
    fn read_i8(&mut self) -> Result<i8, Self::Error>;

    /// Read a big-endian `u16` from the buffer.
    fn read_u16be(&mut self) -> Result<u16, Self::Error>;

    /// Read a big-endian `i16` from the buffer.
    fn read_i16be(&mut self) -> Result<i16, Self::Error>;

    /// Read a big-endian `u16` where 65535 means "absent".
    fn read_u16_opt(&mut self) -> Result<Option<u16>, Self::Error>;

    /// Read a big-endian 24-bit unsigned integer from the buffer.
    fn read_u24be(&mut self) -> Result<u32, Self::Error>;

    /// Read a big-endian `u32` from the buffer.
    fn read_u32be(&mut self) -> Result<u32, Self::Error>;

    /// Read a big-endian `i32` from the buffer.
    fn read_i32be(&mut self) -> Result<i32, Self::Error>;

    /// Read a NUL-terminated CP1252 string from the buffer.
    fn read_cstring(&mut self) -> Result<String, Self::Error>;
}

impl<T: Read> ReadInt for T {
    type Error = Error;

    fn read_u8(&mut self) -> Result<u8, Self::Error> {
        let mut b = [0; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }

    fn read_i8(&mut self) -> Result<i8, Self::Error> {
        let mut b = [0; 1];
        self.read_exact(&mut b)?;
        Ok(i8::from_be_bytes(b))
    }

    fn read_u16be(&mut self) -> Result<u16, Self::Error> {
        let mut b = [0; size_of::<u16>()];
        self.read_exact(&mut b)?;
        Ok(u16::from_be_bytes(b))
    }

    fn read_i16be(&mut self) -> Result<i16, Self::Error> {
        let mut b = [0; size_of::<i16>()];
        self.read_exact(&mut b)?;
        Ok(i16::from_be_bytes(b))
    }

    fn read_u16_opt(&mut self) -> Result<Option<u16>, Self::Error> {
        let value = self.read_u16be()?;
        Ok((value != U16_NONE).then_some(value))
    }

    fn read_u24be(&mut self) -> Result<u32, Self::Error> {
        let mut b = [0; size_of::<u32>()];
        self.read_exact(&mut b[1..])?;
        Ok(u32::from_be_bytes(b))
    }

    fn read_u32be(&mut self) -> Result<u32, Self::Error> {
        let mut b = [0; size_of::<u32>()];
        self.read_exact(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    fn read_i32be(&mut self) -> Result<i32, Self::Error> {
        let mut b = [0; size_of::<i32>()];
        self.read_exact(&mut b)?;
        Ok(i32::from_be_bytes(b))
    }

    fn read_cstring(&mut self) -> Result<String, Self::Error> {
        let mut bytes = Vec::new();
        loop {
            match self.read_u8()? {
                0 => break,
                b => bytes.push(b),
            }
        }
        Ok(charset::decode(&bytes))
    }
}

/// Generic trait for writing integer types to a buffer.
pub trait WriteInt {
    /// Write a `u8`.
    fn write_u8(&mut self, value: u8) -> Result<(), Error>;

    /// Write a big-endian `u16`.
    fn write_u16be(&mut self, value: u16) -> Result<(), Error>;

    /// Write an optional `u16`, using 65535 for `None`.
    fn write_u16_opt(&mut self, value: Option<u16>) -> Result<(), Error>;

    /// Write a big-endian 24-bit unsigned integer.
    ///
    /// Fails with [`ErrorKind::InvalidInput`] if `value` does not fit.
    fn write_u24be(&mut self, value: u32) -> Result<(), Error>;

    /// Write a big-endian `u32`.
    fn write_u32be(&mut self, value: u32) -> Result<(), Error>;

    /// Write a big-endian `i32`.
    fn write_i32be(&mut self, value: i32) -> Result<(), Error>;

    /// Write a NUL-terminated CP1252 string.
    fn write_cstring(&mut self, value: &str) -> Result<(), Error>;
}

impl<T: Write> WriteInt for T {
    fn write_u8(&mut self, value: u8) -> Result<(), Error> {
        self.write_all(&[value])
    }

    fn write_u16be(&mut self, value: u16) -> Result<(), Error> {
        self.write_all(&value.to_be_bytes())
    }

    fn write_u16_opt(&mut self, value: Option<u16>) -> Result<(), Error> {
        self.write_u16be(value.unwrap_or(U16_NONE))
    }

    fn write_u24be(&mut self, value: u32) -> Result<(), Error> {
        if value > 0x00FF_FFFF {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("value {value} does not fit in 24 bits"),
            ));
        }
        self.write_all(&value.to_be_bytes()[1..])
    }

    fn write_u32be(&mut self, value: u32) -> Result<(), Error> {
        self.write_all(&value.to_be_bytes())
    }

    fn write_i32be(&mut self, value: i32) -> Result<(), Error> {
        self.write_all(&value.to_be_bytes())
    }

    fn write_cstring(&mut self, value: &str) -> Result<(), Error> {
        self.write_all(&charset::encode(value))?;
        self.write_all(&[0])
    }
}
