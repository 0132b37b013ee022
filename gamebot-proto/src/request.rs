//! Request payloads sent by the host.
//!
//! The first payload byte is the command code; the rest is command-specific.
//! Multi-byte fields are big-endian. An optional trailing duration is encoded
//! as up to two bytes: absent means "use the default press duration", one
//! byte is taken as the high byte, two bytes are the full value.

use core::fmt;

use crate::frame::{FrameError, MAX_PAYLOAD_LEN};
use crate::types::{Buttons, Hat, InvalidHat, JoystickReport, Stick};

/// Request command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RequestCode {
    Test = b'T',
    QueryState = b'Q',
    Debug = b'D',
    GetUsbOutData = b'O',
    SetAll = b'S',
    SetButtons = b'B',
    SetLeftStick = b'L',
    SetRightStick = b'R',
    SetHat = b'H',
    UnsetAll = b'U',
    SetDefaultDuration = b'M',
    PressAll = b's',
    PressButtons = b'b',
    MoveLeftStick = b'l',
    MoveRightStick = b'r',
    PressHat = b'h',
    Clear = b'C',
    Pause = b'P',
    ReportPending = b'p',
}

impl TryFrom<u8> for RequestCode {
    type Error = RequestError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            b'T' => Self::Test,
            b'Q' => Self::QueryState,
            b'D' => Self::Debug,
            b'O' => Self::GetUsbOutData,
            b'S' => Self::SetAll,
            b'B' => Self::SetButtons,
            b'L' => Self::SetLeftStick,
            b'R' => Self::SetRightStick,
            b'H' => Self::SetHat,
            b'U' => Self::UnsetAll,
            b'M' => Self::SetDefaultDuration,
            b's' => Self::PressAll,
            b'b' => Self::PressButtons,
            b'l' => Self::MoveLeftStick,
            b'r' => Self::MoveRightStick,
            b'h' => Self::PressHat,
            b'C' => Self::Clear,
            b'P' => Self::Pause,
            b'p' => Self::ReportPending,
            other => return Err(RequestError::UnknownCommand(other)),
        })
    }
}

/// Errors produced while parsing a request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestError {
    /// Zero-length payload.
    Empty,
    /// Leading byte is not a known command.
    UnknownCommand(u8),
    /// Payload length outside the range the command accepts.
    Length,
    /// Hat byte outside `0..=8`.
    InvalidHat(u8),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty request"),
            Self::UnknownCommand(code) => write!(f, "unknown command 0x{:02x}", code),
            Self::Length => write!(f, "bad request length"),
            Self::InvalidHat(value) => write!(f, "invalid hat value {}", value),
        }
    }
}

impl From<InvalidHat> for RequestError {
    fn from(err: InvalidHat) -> Self {
        Self::InvalidHat(err.0)
    }
}

/// Which part of the joystick state a press or set command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    All(JoystickReport),
    Buttons(Buttons),
    LeftStick(Stick),
    RightStick(Stick),
    Hat(Hat),
}

impl Target {
    /// Write this target's fields into `report`, leaving the rest alone.
    pub fn apply(&self, report: &mut JoystickReport) {
        match *self {
            Self::All(all) => *report = all,
            Self::Buttons(buttons) => report.buttons = buttons,
            Self::LeftStick(stick) => report.left = stick,
            Self::RightStick(stick) => report.right = stick,
            Self::Hat(hat) => report.hat = hat,
        }
    }

    /// Neutral report with only this target applied.
    #[must_use]
    pub fn to_report(&self) -> JoystickReport {
        let mut report = JoystickReport::neutral();
        self.apply(&mut report);
        report
    }

    fn parse(code: RequestCode, fields: &[u8]) -> Result<Self, RequestError> {
        let target = match code {
            RequestCode::PressAll | RequestCode::SetAll => Self::All(JoystickReport {
                buttons: Buttons(u16::from_be_bytes([fields[0], fields[1]])),
                hat: Hat::try_from(fields[2])?,
                left: Stick::new(fields[3], fields[4]),
                right: Stick::new(fields[5], fields[6]),
            }),
            RequestCode::PressButtons | RequestCode::SetButtons => {
                Self::Buttons(Buttons(u16::from_be_bytes([fields[0], fields[1]])))
            }
            RequestCode::MoveLeftStick | RequestCode::SetLeftStick => {
                Self::LeftStick(Stick::new(fields[0], fields[1]))
            }
            RequestCode::MoveRightStick | RequestCode::SetRightStick => {
                Self::RightStick(Stick::new(fields[0], fields[1]))
            }
            RequestCode::PressHat | RequestCode::SetHat => Self::Hat(Hat::try_from(fields[0])?),
            _ => return Err(RequestError::UnknownCommand(code as u8)),
        };
        Ok(target)
    }

    /// Bytes this target occupies after the command code.
    const fn field_len(code: RequestCode) -> usize {
        match code {
            RequestCode::PressAll | RequestCode::SetAll => 7,
            RequestCode::PressHat | RequestCode::SetHat => 1,
            _ => 2,
        }
    }

    fn write_fields(&self, out: &mut [u8]) -> usize {
        match *self {
            Self::All(report) => {
                out[..2].copy_from_slice(&report.buttons.raw().to_be_bytes());
                out[2] = report.hat.into();
                out[3] = report.left.x;
                out[4] = report.left.y;
                out[5] = report.right.x;
                out[6] = report.right.y;
                7
            }
            Self::Buttons(buttons) => {
                out[..2].copy_from_slice(&buttons.raw().to_be_bytes());
                2
            }
            Self::LeftStick(stick) | Self::RightStick(stick) => {
                out[0] = stick.x;
                out[1] = stick.y;
                2
            }
            Self::Hat(hat) => {
                out[0] = hat.into();
                1
            }
        }
    }

    const fn press_code(&self) -> RequestCode {
        match self {
            Self::All(_) => RequestCode::PressAll,
            Self::Buttons(_) => RequestCode::PressButtons,
            Self::LeftStick(_) => RequestCode::MoveLeftStick,
            Self::RightStick(_) => RequestCode::MoveRightStick,
            Self::Hat(_) => RequestCode::PressHat,
        }
    }

    const fn set_code(&self) -> RequestCode {
        match self {
            Self::All(_) => RequestCode::SetAll,
            Self::Buttons(_) => RequestCode::SetButtons,
            Self::LeftStick(_) => RequestCode::SetLeftStick,
            Self::RightStick(_) => RequestCode::SetRightStick,
            Self::Hat(_) => RequestCode::SetHat,
        }
    }
}

/// A parsed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Liveness probe, answered with `'A'`.
    Test,
    QueryState,
    Debug,
    GetUsbOutData,
    /// Hold `target` for the duration, then release to neutral.
    Press {
        target: Target,
        duration_ms: Option<u16>,
    },
    /// Hold `target` for the duration with no release step.
    Set {
        target: Target,
        duration_ms: Option<u16>,
    },
    /// Hold the neutral state for the duration.
    Unset { duration_ms: Option<u16> },
    SetDefaultDuration(u16),
    /// Neutral state for exactly this many milliseconds.
    Pause(u16),
    ReportPending,
    Clear,
}

impl Request {
    /// Parse a frame payload into a request.
    pub fn parse(payload: &[u8]) -> Result<Self, RequestError> {
        let (&first, rest) = payload.split_first().ok_or(RequestError::Empty)?;
        let code = RequestCode::try_from(first)?;

        let request = match code {
            RequestCode::Test => no_args(rest, Self::Test)?,
            RequestCode::QueryState => no_args(rest, Self::QueryState)?,
            RequestCode::Debug => no_args(rest, Self::Debug)?,
            RequestCode::GetUsbOutData => no_args(rest, Self::GetUsbOutData)?,
            RequestCode::ReportPending => no_args(rest, Self::ReportPending)?,
            RequestCode::Clear => no_args(rest, Self::Clear)?,
            RequestCode::UnsetAll => Self::Unset {
                duration_ms: parse_duration(rest)?,
            },
            RequestCode::SetDefaultDuration => Self::SetDefaultDuration(exact_u16(rest)?),
            RequestCode::Pause => Self::Pause(exact_u16(rest)?),
            RequestCode::PressAll
            | RequestCode::PressButtons
            | RequestCode::MoveLeftStick
            | RequestCode::MoveRightStick
            | RequestCode::PressHat => {
                let (target, duration_ms) = parse_targeted(code, rest)?;
                Self::Press {
                    target,
                    duration_ms,
                }
            }
            RequestCode::SetAll
            | RequestCode::SetButtons
            | RequestCode::SetLeftStick
            | RequestCode::SetRightStick
            | RequestCode::SetHat => {
                let (target, duration_ms) = parse_targeted(code, rest)?;
                Self::Set {
                    target,
                    duration_ms,
                }
            }
        };
        Ok(request)
    }

    /// Command code this request is sent with.
    #[must_use]
    pub const fn code(&self) -> RequestCode {
        match self {
            Self::Test => RequestCode::Test,
            Self::QueryState => RequestCode::QueryState,
            Self::Debug => RequestCode::Debug,
            Self::GetUsbOutData => RequestCode::GetUsbOutData,
            Self::Press { target, .. } => target.press_code(),
            Self::Set { target, .. } => target.set_code(),
            Self::Unset { .. } => RequestCode::UnsetAll,
            Self::SetDefaultDuration(_) => RequestCode::SetDefaultDuration,
            Self::Pause(_) => RequestCode::Pause,
            Self::ReportPending => RequestCode::ReportPending,
            Self::Clear => RequestCode::Clear,
        }
    }

    /// Encode the request payload (without framing) into `buf`.
    ///
    /// Returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, FrameError> {
        let mut out = [0u8; MAX_PAYLOAD_LEN];
        out[0] = self.code() as u8;
        let mut len = 1;

        match *self {
            Self::Press {
                target,
                duration_ms,
            }
            | Self::Set {
                target,
                duration_ms,
            } => {
                len += target.write_fields(&mut out[1..]);
                len += write_duration(duration_ms, &mut out[len..]);
            }
            Self::Unset { duration_ms } => {
                len += write_duration(duration_ms, &mut out[len..]);
            }
            Self::SetDefaultDuration(ms) | Self::Pause(ms) => {
                len += write_duration(Some(ms), &mut out[len..]);
            }
            _ => {}
        }

        if buf.len() < len {
            return Err(FrameError::BufferTooSmall);
        }
        buf[..len].copy_from_slice(&out[..len]);
        Ok(len)
    }
}

fn no_args(rest: &[u8], request: Request) -> Result<Request, RequestError> {
    if rest.is_empty() {
        Ok(request)
    } else {
        Err(RequestError::Length)
    }
}

fn exact_u16(rest: &[u8]) -> Result<u16, RequestError> {
    match rest {
        [hi, lo] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(RequestError::Length),
    }
}

fn parse_duration(bytes: &[u8]) -> Result<Option<u16>, RequestError> {
    match bytes {
        [] => Ok(None),
        [hi] => Ok(Some(u16::from(*hi) << 8)),
        [hi, lo] => Ok(Some(u16::from_be_bytes([*hi, *lo]))),
        _ => Err(RequestError::Length),
    }
}

fn parse_targeted(code: RequestCode, rest: &[u8]) -> Result<(Target, Option<u16>), RequestError> {
    let field_len = Target::field_len(code);
    if rest.len() < field_len {
        return Err(RequestError::Length);
    }
    let (fields, duration) = rest.split_at(field_len);
    let duration_ms = parse_duration(duration)?;
    let target = Target::parse(code, fields)?;
    Ok((target, duration_ms))
}

fn write_duration(duration_ms: Option<u16>, out: &mut [u8]) -> usize {
    match duration_ms {
        Some(ms) => {
            out[..2].copy_from_slice(&ms.to_be_bytes());
            2
        }
        None => 0,
    }
}
