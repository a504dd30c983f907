use std::fmt::{Display, Formatter};

/// Stream format tag handed to the encoder and decoder constructors.
///
/// Only the compressed formats that IEC 61937 can carry are accepted; the
/// remaining tags exist so callers can ask before constructing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Pcm16Bit,
    PcmFloat,
    Mp3,
    Aac,
    Ac3,
    EAc3,
    EAc3Joc,
    Dts,
    DtsHd,
}

impl AudioFormat {
    pub const fn is_spdif_supported(self) -> bool {
        matches!(
            self,
            Self::Ac3 | Self::EAc3 | Self::EAc3Joc | Self::Dts | Self::DtsHd
        )
    }
}

impl Display for AudioFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pcm16Bit => "PCM 16-bit",
            Self::PcmFloat => "PCM float",
            Self::Mp3 => "MP3",
            Self::Aac => "AAC",
            Self::Ac3 => "AC3",
            Self::EAc3 => "E-AC3",
            Self::EAc3Joc => "E-AC3 JOC",
            Self::Dts => "DTS",
            Self::DtsHd => "DTS-HD",
        };

        f.write_str(name)
    }
}

#[test]
fn supported_formats() {
    assert!(!AudioFormat::PcmFloat.is_spdif_supported());
    assert!(!AudioFormat::Pcm16Bit.is_spdif_supported());
    assert!(!AudioFormat::Mp3.is_spdif_supported());

    assert!(AudioFormat::Ac3.is_spdif_supported());
    assert!(AudioFormat::EAc3.is_spdif_supported());
    assert!(AudioFormat::Dts.is_spdif_supported());
    assert!(AudioFormat::DtsHd.is_spdif_supported());
}
