use core::fmt;

/// Host-provided operations reachable through the `SystemCall*` opcodes.
///
/// The catalog is fixed at compile time; the `u16` bytecode id is the enum
/// discriminant. Each entry declares how many value and object operands it
/// consumes and what it returns, which must agree with the `SystemCall`
/// opcode variant the compiler emits for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum SystemCall {
    /// `Add(lhs as Number, rhs as Number) as Number`
    Add = 0,
    /// `AvailableLocales() as List of String`
    AvailableLocales = 1,
    /// `AvailableTimeZones() as List of TimeZone`
    AvailableTimeZones = 2,
    /// `Characters(input as String) as List of String`
    Characters1 = 3,
    /// `Characters(input as String, locale as String) as List of String`
    Characters2 = 4,
    /// `Chr(input as Number) as String`
    Chr = 5,
    /// `DateFromParts(year as Number, month as Number, day as Number) as Date`
    DateFromParts = 6,
    /// `DateTimeFromParts(year, month, day, hour, minute, second, millisecond) as DateTime`
    DateTimeFromParts = 7,
    /// `DateTimeOffsetFromParts(year, ..., millisecond, timeZone as TimeZone) as DateTimeOffset`
    DateTimeOffsetFromParts = 8,
    /// `Days(count as Number) as TimeSpan`
    Days = 9,
    /// `FlushConsoleOutput()`
    FlushConsoleOutput = 10,
    /// `HasValue(input as Optional Object) as Boolean`
    HasValueO = 11,
    /// `HasValue(input as Optional Value) as Boolean`
    HasValueV = 12,
    /// `Hours(count as Number) as TimeSpan`
    Hours = 13,
    /// `Len(input as String) as Number`
    Len = 14,
    /// `Milliseconds(count as Number) as TimeSpan`
    Milliseconds = 15,
    /// `Minutes(count as Number) as TimeSpan`
    Minutes = 16,
    /// `NumberToString(input as Number) as String`
    NumberToString = 17,
    /// `ObjectListGet(input as List of Object, index as Number) as Object`
    ObjectListGet = 18,
    /// `ObjectListLength(input as List of Object) as Number`
    ObjectListLength = 19,
    /// `ObjectOptionalNewMissing() as Optional Object`
    ObjectOptionalNewMissing = 20,
    /// `ObjectOptionalNewPresent(input as Object) as Optional Object`
    ObjectOptionalNewPresent = 21,
    /// `PrintString(input as String)`
    PrintString = 22,
    /// `Seconds(count as Number) as TimeSpan`
    Seconds = 23,
    /// `TimeZoneFromName(name as String) as TimeZone`
    TimeZoneFromName = 24,
    /// `TotalDays(span as TimeSpan) as Number`
    TotalDays = 25,
    /// `TotalHours(span as TimeSpan) as Number`
    TotalHours = 26,
    /// `TotalMilliseconds(span as TimeSpan) as Number`
    TotalMilliseconds = 27,
    /// `TotalMinutes(span as TimeSpan) as Number`
    TotalMinutes = 28,
    /// `TotalSeconds(span as TimeSpan) as Number`
    TotalSeconds = 29,
    /// `UtcOffset(timeZone as TimeZone, dateTime as DateTime) as TimeSpan`
    UtcOffset = 30,
    /// `Value(input as Optional Object) as Object`
    ValueO = 31,
    /// `ValueOptionalNewMissing() as Optional Value`
    ValueOptionalNewMissing = 32,
    /// `ValueOptionalNewPresent(input as Value) as Optional Value`
    ValueOptionalNewPresent = 33,
    /// `Value(input as Optional Value) as Number`
    ValueV = 34,
}

/// Operand counts and return shape of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemCallShape {
    /// Value operands consumed.
    pub num_value_args: u8,
    /// Object operands consumed.
    pub num_object_args: u8,
    /// Whether a value is pushed on success.
    pub returns_value: bool,
    /// Whether an object is pushed on success.
    pub returns_object: bool,
}

const fn shape(
    num_value_args: u8,
    num_object_args: u8,
    returns_value: bool,
    returns_object: bool,
) -> SystemCallShape {
    SystemCallShape {
        num_value_args,
        num_object_args,
        returns_value,
        returns_object,
    }
}

impl SystemCall {
    /// The `u16` the bytecode references.
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Declared arity and direction.
    pub const fn shape(self) -> SystemCallShape {
        use SystemCall::*;
        match self {
            Add => shape(2, 0, true, false),
            AvailableLocales => shape(0, 0, false, true),
            AvailableTimeZones => shape(0, 0, false, true),
            Characters1 => shape(0, 1, false, true),
            Characters2 => shape(0, 2, false, true),
            Chr => shape(1, 0, false, true),
            DateFromParts => shape(3, 0, true, false),
            DateTimeFromParts => shape(7, 0, true, false),
            DateTimeOffsetFromParts => shape(7, 1, false, true),
            Days => shape(1, 0, true, false),
            FlushConsoleOutput => shape(0, 0, false, false),
            HasValueO => shape(0, 1, true, false),
            HasValueV => shape(0, 1, true, false),
            Hours => shape(1, 0, true, false),
            Len => shape(0, 1, true, false),
            Milliseconds => shape(1, 0, true, false),
            Minutes => shape(1, 0, true, false),
            NumberToString => shape(1, 0, false, true),
            ObjectListGet => shape(1, 1, false, true),
            ObjectListLength => shape(0, 1, true, false),
            ObjectOptionalNewMissing => shape(0, 0, false, true),
            ObjectOptionalNewPresent => shape(0, 1, false, true),
            PrintString => shape(0, 1, false, false),
            Seconds => shape(1, 0, true, false),
            TimeZoneFromName => shape(0, 1, false, true),
            TotalDays => shape(1, 0, true, false),
            TotalHours => shape(1, 0, true, false),
            TotalMilliseconds => shape(1, 0, true, false),
            TotalMinutes => shape(1, 0, true, false),
            TotalSeconds => shape(1, 0, true, false),
            UtcOffset => shape(1, 1, true, false),
            ValueO => shape(0, 1, false, true),
            ValueOptionalNewMissing => shape(0, 0, false, true),
            ValueOptionalNewPresent => shape(1, 0, false, true),
            ValueV => shape(0, 1, true, false),
        }
    }
}

impl fmt::Display for SystemCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl TryFrom<u16> for SystemCall {
    type Error = u16;

    /// Decode a bytecode system-call id; the offending id comes back on
    /// failure.
    fn try_from(id: u16) -> Result<Self, u16> {
        use SystemCall::*;
        Ok(match id {
            0 => Add,
            1 => AvailableLocales,
            2 => AvailableTimeZones,
            3 => Characters1,
            4 => Characters2,
            5 => Chr,
            6 => DateFromParts,
            7 => DateTimeFromParts,
            8 => DateTimeOffsetFromParts,
            9 => Days,
            10 => FlushConsoleOutput,
            11 => HasValueO,
            12 => HasValueV,
            13 => Hours,
            14 => Len,
            15 => Milliseconds,
            16 => Minutes,
            17 => NumberToString,
            18 => ObjectListGet,
            19 => ObjectListLength,
            20 => ObjectOptionalNewMissing,
            21 => ObjectOptionalNewPresent,
            22 => PrintString,
            23 => Seconds,
            24 => TimeZoneFromName,
            25 => TotalDays,
            26 => TotalHours,
            27 => TotalMilliseconds,
            28 => TotalMinutes,
            29 => TotalSeconds,
            30 => UtcOffset,
            31 => ValueO,
            32 => ValueOptionalNewMissing,
            33 => ValueOptionalNewPresent,
            34 => ValueV,
            _ => return Err(id),
        })
    }
}
