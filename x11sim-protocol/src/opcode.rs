/// Core protocol request opcodes issued by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    CreateWindow = 1,
    MapWindow = 8,
    ChangeProperty = 18,
    GrabPointer = 26,
    UngrabPointer = 27,
    GrabKeyboard = 31,
    UngrabKeyboard = 32,
    OpenFont = 45,
    CloseFont = 46,
    QueryFont = 47,
    ListFonts = 49,
    CreateGc = 55,
    PolyPoint = 64,
    PolyLine = 65,
    PolySegment = 66,
    PolyRectangle = 67,
    PolyArc = 68,
    FillPoly = 69,
    PolyFillRectangle = 70,
    PolyFillArc = 71,
    PutImage = 72,
    PolyText8 = 74,
    PolyText16 = 75,
    ImageText8 = 76,
    ImageText16 = 77,
}

impl Opcode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let opcode = match code {
            1 => Self::CreateWindow,
            8 => Self::MapWindow,
            18 => Self::ChangeProperty,
            26 => Self::GrabPointer,
            27 => Self::UngrabPointer,
            31 => Self::GrabKeyboard,
            32 => Self::UngrabKeyboard,
            45 => Self::OpenFont,
            46 => Self::CloseFont,
            47 => Self::QueryFont,
            49 => Self::ListFonts,
            55 => Self::CreateGc,
            64 => Self::PolyPoint,
            65 => Self::PolyLine,
            66 => Self::PolySegment,
            67 => Self::PolyRectangle,
            68 => Self::PolyArc,
            69 => Self::FillPoly,
            70 => Self::PolyFillRectangle,
            71 => Self::PolyFillArc,
            72 => Self::PutImage,
            74 => Self::PolyText8,
            75 => Self::PolyText16,
            76 => Self::ImageText8,
            77 => Self::ImageText16,
            _ => return None,
        };
        Some(opcode)
    }

    /// Requests the simulator waits on. The grab requests also produce replies on a
    /// real server, but the simulator sends them without waiting.
    pub fn awaits_reply(self) -> bool {
        matches!(self, Self::QueryFont | Self::ListFonts)
    }
}
