//! Joystick input types: Buttons, Hat, Stick, JoystickReport.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Button state represented as a bitfield.
///
/// Bit positions follow the Switch-style pad layout used by the host
/// scripts. Implements bitwise operators for ergonomic button manipulation.
///
/// # Example
///
/// ```
/// use gamebot_proto::Buttons;
///
/// let buttons = Buttons::A | Buttons::B;
/// assert!(buttons.contains(Buttons::A));
/// assert!(buttons.contains(Buttons::B));
/// assert!(!buttons.contains(Buttons::X));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u16);

impl Buttons {
    pub const Y: Self = Self(1 << 0);
    pub const B: Self = Self(1 << 1);
    pub const A: Self = Self(1 << 2);
    pub const X: Self = Self(1 << 3);
    pub const L: Self = Self(1 << 4);
    pub const R: Self = Self(1 << 5);
    pub const ZL: Self = Self(1 << 6);
    pub const ZR: Self = Self(1 << 7);
    pub const MINUS: Self = Self(1 << 8);
    pub const PLUS: Self = Self(1 << 9);
    pub const LCLICK: Self = Self(1 << 10); // Left stick press
    pub const RCLICK: Self = Self(1 << 11); // Right stick press
    pub const HOME: Self = Self(1 << 12);
    pub const CAPTURE: Self = Self(1 << 13);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: Buttons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Buttons {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for Buttons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// Hat switch (D-pad) direction.
///
/// Wire values 0..=7 run clockwise from `Top`; 8 is the released position.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Hat {
    Top = 0x00,
    TopRight = 0x01,
    Right = 0x02,
    BottomRight = 0x03,
    Bottom = 0x04,
    BottomLeft = 0x05,
    Left = 0x06,
    TopLeft = 0x07,
    #[default]
    Center = 0x08,
}

/// A hat byte outside `0..=8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidHat(pub u8);

impl TryFrom<u8> for Hat {
    type Error = InvalidHat;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Hat::Top,
            0x01 => Hat::TopRight,
            0x02 => Hat::Right,
            0x03 => Hat::BottomRight,
            0x04 => Hat::Bottom,
            0x05 => Hat::BottomLeft,
            0x06 => Hat::Left,
            0x07 => Hat::TopLeft,
            0x08 => Hat::Center,
            other => return Err(InvalidHat(other)),
        })
    }
}

impl From<Hat> for u8 {
    #[inline]
    fn from(hat: Hat) -> Self {
        hat as u8
    }
}

/// Analog stick with unsigned X/Y axes.
///
/// X grows to the right, Y grows downward. `0x80` is centered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stick {
    pub x: u8,
    pub y: u8,
}

impl Stick {
    pub const MIN: u8 = 0x00;
    pub const CENTER: u8 = 0x80;
    pub const MAX: u8 = 0xFF;

    pub const NEUTRAL: Self = Self {
        x: Self::CENTER,
        y: Self::CENTER,
    };

    #[must_use]
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl Default for Stick {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// The HID input report presented to the console.
///
/// Layout on the wire (8 bytes): buttons (LE u16), hat, LX, LY, RX, RY,
/// one vendor byte that is always zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoystickReport {
    pub buttons: Buttons,
    pub hat: Hat,
    pub left: Stick,
    pub right: Stick,
}

impl JoystickReport {
    /// Size of the encoded report in bytes.
    pub const SIZE: usize = 8;

    /// All buttons released, hat centered, sticks centered.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            buttons: Buttons::NONE,
            hat: Hat::Center,
            left: Stick::NEUTRAL,
            right: Stick::NEUTRAL,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }

    /// Encode the report for the HID IN endpoint.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let buttons = self.buttons.raw().to_le_bytes();
        [
            buttons[0],
            buttons[1],
            self.hat as u8,
            self.left.x,
            self.left.y,
            self.right.x,
            self.right.y,
            0,
        ]
    }
}

impl Default for JoystickReport {
    fn default() -> Self {
        Self::neutral()
    }
}
