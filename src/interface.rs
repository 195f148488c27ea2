//! Register transport port and the I2C implementation of it
use embedded_hal::i2c::I2c;

use crate::register::Register;

/// Word-wide access to the device registers.
///
/// Implementations perform exactly one bus transaction per call and do not retry. Any error is
/// passed to the caller unchanged.
pub trait RegisterInterface {
    type Error;

    fn write_register(&mut self, register: Register, word: u16) -> Result<(), Self::Error>;
    fn read_register(&mut self, register: Register) -> Result<u16, Self::Error>;
}

impl<T: RegisterInterface + ?Sized> RegisterInterface for &mut T {
    type Error = T::Error;

    #[inline]
    fn write_register(&mut self, register: Register, word: u16) -> Result<(), Self::Error> {
        T::write_register(self, register, word)
    }

    #[inline]
    fn read_register(&mut self, register: Register) -> Result<u16, Self::Error> {
        T::read_register(self, register)
    }
}

/// I2C address selected by the ADDR pin strapping
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveAddr {
    #[default]
    Gnd = 0x48,
    Vdd = 0x49,
    Sda = 0x4A,
    Scl = 0x4B,
}

impl SlaveAddr {
    #[inline]
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// [RegisterInterface] on top of a blocking I2C bus. Register words are transferred MSB first,
/// preceded by the register pointer byte.
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cInterface<I2C> {
    pub fn new(i2c: I2C, address: SlaveAddr) -> Self {
        Self {
            i2c,
            address: address.addr(),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the I2C bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterInterface for I2cInterface<I2C> {
    type Error = I2C::Error;

    fn write_register(&mut self, register: Register, word: u16) -> Result<(), Self::Error> {
        let [msb, lsb] = word.to_be_bytes();
        self.i2c.write(self.address, &[register.addr(), msb, lsb])
    }

    fn read_register(&mut self, register: Register) -> Result<u16, Self::Error> {
        let mut reply = [0; 2];
        self.i2c
            .write_read(self.address, &[register.addr()], &mut reply)?;
        Ok(u16::from_be_bytes(reply))
    }
}
