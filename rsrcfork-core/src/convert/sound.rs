//! `snd ` resources, repackaged verbatim into AIFF-C containers

use super::{ConvertContext, ConvertedArtifact};
use crate::cursor::ByteReader;
use crate::error::ForkError;
use crate::types::Resource;
use bytes::{BufMut, Bytes, BytesMut};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

const FORMAT_STANDARD: u16 = 1;
const FORMAT_HYPERCARD: u16 = 2;

const SOUND_CMD: u16 = 80;
const BUFFER_CMD: u16 = 81;

const INIT_MACE3: u32 = 0x0300;
const INIT_MACE6: u32 = 0x0400;

const ENCODING_STANDARD: u8 = 0x00;
const ENCODING_COMPRESSED: u8 = 0xFE;
const ENCODING_EXTENDED: u8 = 0xFF;

const AIFC_VERSION_1: u32 = 0xA280_5140;
const MIDDLE_C: u8 = 60;
const LOOP_BEGIN_MARKER: u16 = 101;
const LOOP_END_MARKER: u16 = 102;

/// Packet geometry of a sample codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    pub four_cc: [u8; 4],
    pub name: &'static str,
    pub samples_per_packet: u32,
    pub bytes_per_packet: usize,
    pub bits: u16,
}

const CODECS: [Codec; 8] = [
    Codec { four_cc: *b"MAC3", name: "MACE 3-to-1", samples_per_packet: 6, bytes_per_packet: 2, bits: 8 },
    Codec { four_cc: *b"MAC6", name: "MACE 6-to-1", samples_per_packet: 6, bytes_per_packet: 1, bits: 8 },
    Codec { four_cc: *b"ima4", name: "IMA 16 bit 4-to-1", samples_per_packet: 64, bytes_per_packet: 34, bits: 16 },
    Codec { four_cc: *b"twos", name: "Signed big-endian PCM", samples_per_packet: 1, bytes_per_packet: 2, bits: 16 },
    Codec { four_cc: *b"sowt", name: "Signed little-endian PCM", samples_per_packet: 1, bytes_per_packet: 2, bits: 16 },
    Codec { four_cc: *b"raw ", name: "Unsigned PCM", samples_per_packet: 1, bytes_per_packet: 1, bits: 8 },
    Codec { four_cc: *b"ulaw", name: "mu-law", samples_per_packet: 1, bytes_per_packet: 1, bits: 8 },
    Codec { four_cc: *b"alaw", name: "A-law", samples_per_packet: 1, bytes_per_packet: 1, bits: 8 },
];

/// Name written for codecs outside the known table
const OPAQUE_CODEC_NAME: &str = "Unknown compression";

/// Look up a codec by its four-character tag
pub fn codec_info(four_cc: &[u8; 4]) -> Option<&'static Codec> {
    CODECS.iter().find(|c| &c.four_cc == four_cc)
}

/// Sample data lifted out of a `snd ` resource along with the header fields
/// an AIFF-C container needs
#[derive(Debug, Clone, PartialEq)]
pub struct AiffSound {
    /// Compression tag, copied into the COMM chunk
    pub codec: [u8; 4],
    /// True when the codec is not in the known table; its sample bytes run to
    /// the end of the resource
    pub opaque: bool,
    pub sample_rate: f64,
    pub channels: u16,
    /// Packet count, as stored in the sound header
    pub frames: u32,
    pub bits: u16,
    pub loop_start: u32,
    pub loop_end: u32,
    pub base_note: u8,
    /// Resource name, written as the NAME chunk
    pub name: Option<Bytes>,
    pub samples: Bytes,
}

impl AiffSound {
    pub fn has_loop(&self) -> bool {
        self.loop_end.saturating_sub(self.loop_start) > 1
    }

    fn codec_name(&self) -> &'static str {
        codec_info(&self.codec)
            .map(|c| c.name)
            .unwrap_or(OPAQUE_CODEC_NAME)
    }

    /// Serialize as `FORM`/`AIFC` with FVER, COMM, optional MARK and INST,
    /// optional NAME, ANNO and SSND chunks
    pub fn to_aiff_c(&self) -> Bytes {
        let has_loop = self.has_loop();
        let mut form = BytesMut::with_capacity(self.samples.len() + 256);
        form.put_slice(b"AIFC");

        put_chunk(&mut form, b"FVER", &AIFC_VERSION_1.to_be_bytes());

        let mut comm = BytesMut::new();
        comm.put_u16(self.channels);
        comm.put_u32(self.frames);
        comm.put_u16(self.bits);
        comm.put_slice(&ieee_extended(self.sample_rate));
        comm.put_slice(&self.codec);
        put_pstr_even(&mut comm, self.codec_name().as_bytes());
        put_chunk(&mut form, b"COMM", &comm);

        if has_loop {
            let mut mark = BytesMut::new();
            mark.put_u16(2);
            mark.put_u16(LOOP_BEGIN_MARKER);
            mark.put_u32(self.loop_start);
            put_pstr_even(&mut mark, b"beg loop");
            mark.put_u16(LOOP_END_MARKER);
            mark.put_u32(self.loop_end);
            put_pstr_even(&mut mark, b"end loop");
            put_chunk(&mut form, b"MARK", &mark);
        }

        if self.base_note != MIDDLE_C || has_loop {
            let mut inst = BytesMut::new();
            // base note, detune, note range, velocity range
            inst.put_slice(&[self.base_note, 0, 0x00, 0x7F, 0x00, 0x7F]);
            inst.put_u16(0); // gain
            if has_loop {
                inst.put_u16(1);
                inst.put_u16(LOOP_BEGIN_MARKER);
                inst.put_u16(LOOP_END_MARKER);
            } else {
                inst.put_slice(&[0; 6]);
            }
            // release loop unused
            inst.put_slice(&[0; 6]);
            put_chunk(&mut form, b"INST", &inst);
        }

        if let Some(name) = self.name.as_ref().filter(|n| !n.is_empty()) {
            put_chunk(&mut form, b"NAME", name);
        }

        let anno = format!(
            "Verbatim copy of data stream from 'snd ' resource.\n\
             MIDI base note: {}, sustain loop: {}-{}\n",
            self.base_note, self.loop_start, self.loop_end
        );
        put_chunk(&mut form, b"ANNO", anno.as_bytes());

        let mut ssnd = BytesMut::with_capacity(self.samples.len() + 8);
        ssnd.put_u32(0); // offset
        ssnd.put_u32(0); // block size
        ssnd.put_slice(&self.samples);
        put_chunk(&mut form, b"SSND", &ssnd);

        let mut out = BytesMut::with_capacity(form.len() + 8);
        put_chunk(&mut out, b"FORM", &form);
        out.freeze()
    }
}

/// IFF chunk; odd bodies get a pad byte that the length does not count
fn put_chunk(out: &mut BytesMut, id: &[u8; 4], body: &[u8]) {
    out.put_slice(id);
    out.put_u32(body.len() as u32);
    out.put_slice(body);
    if body.len() % 2 == 1 {
        out.put_u8(0);
    }
}

/// Pascal string padded to an even total length
fn put_pstr_even(out: &mut BytesMut, text: &[u8]) {
    let text = &text[..text.len().min(255)];
    out.put_u8(text.len() as u8);
    out.put_slice(text);
    if (1 + text.len()) % 2 == 1 {
        out.put_u8(0);
    }
}

/// 80-bit IEEE 754 extended precision, big-endian
pub fn ieee_extended(value: f64) -> [u8; 10] {
    let mut out = [0u8; 10];
    if value == 0.0 {
        return out;
    }
    let bits = value.to_bits();
    let sign = ((bits >> 63) as u16) << 15;
    let exponent = ((bits >> 52) & 0x7FF) as i32;
    let fraction = bits & ((1u64 << 52) - 1);

    let (exponent, mantissa) = match exponent {
        0x7FF => (0x7FFF, (1u64 << 63) | (fraction << 11)),
        0 => {
            // subnormal: shift the leading one into the integer bit
            let shift = fraction.leading_zeros();
            (15372 - shift as i32, fraction << shift)
        }
        e => (e - 1023 + 16383, (1u64 << 63) | (fraction << 11)),
    };

    out[0..2].copy_from_slice(&(sign | exponent as u16).to_be_bytes());
    out[2..10].copy_from_slice(&mantissa.to_be_bytes());
    out
}

fn malformed(msg: impl Into<String>) -> ForkError {
    ForkError::MalformedSound(msg.into())
}

/// Locate the sound header of a `snd ` resource and lift out its samples
pub fn parse_snd(data: &[u8], name: Option<Bytes>) -> Result<AiffSound, ForkError> {
    let mut r = ByteReader::new(data);

    let default_codec = match r.u16()? {
        FORMAT_STANDARD => {
            let modifiers = r.i16()?;
            let synth = r.u16()?;
            let init = r.u32()?;
            if modifiers != 1 {
                return Err(malformed(format!("{modifiers} data types, expected 1")));
            }
            #[cfg(feature = "logging")]
            if synth != 5 {
                warn!("Sound uses synthesizer {} instead of sampled sound", synth);
            }
            #[cfg(not(feature = "logging"))]
            let _ = synth;
            if init & INIT_MACE6 != 0 {
                *b"MAC6"
            } else if init & INIT_MACE3 != 0 {
                *b"MAC3"
            } else {
                *b"????"
            }
        }
        FORMAT_HYPERCARD => {
            let _ref_count = r.u16()?;
            *b"MAC3"
        }
        other => return Err(malformed(format!("unsupported sound format {other}"))),
    };

    let commands = r.i16()?;
    let mut header_offset = None;
    for _ in 0..commands.max(0) {
        let cmd = r.u16()? & 0x7FFF;
        let _param1 = r.u16()?;
        let param2 = r.u32()?;
        if cmd == SOUND_CMD || cmd == BUFFER_CMD {
            header_offset = Some(param2 as usize);
            break;
        }
    }
    let header_offset = header_offset.ok_or_else(|| malformed("no sound or buffer command"))?;
    r.seek(header_offset)?;

    let sample_ptr = r.u32()?;
    if sample_ptr != 0 {
        return Err(malformed("sample data is not stored in the resource"));
    }
    let union = r.i32()?;
    let rate_fixed = r.u32()?;
    let loop_start = r.u32()?;
    let loop_end = r.u32()?;
    let encoding = r.u8()?;
    let base_note = r.u8()?;

    let count = |value: i32, what: &str| {
        u32::try_from(value).map_err(|_| malformed(format!("negative {what} {value}")))
    };

    let (codec, channels, packets) = match encoding {
        ENCODING_STANDARD => (*b"raw ", 1, count(union, "frame count")?),
        ENCODING_COMPRESSED => {
            let packets = count(r.i32()?, "packet count")?;
            r.skip(14)?;
            let tag = r.four_cc()?;
            r.skip(20)?;
            let codec = if tag == [0; 4] { default_codec } else { tag };
            (codec, count(union, "channel count")?, packets)
        }
        ENCODING_EXTENDED => {
            let packets = count(r.i32()?, "packet count")?;
            r.skip(22)?;
            let depth = r.i16()?;
            r.skip(14)?;
            let codec = match depth {
                8 => *b"raw ",
                16 => *b"twos",
                d => return Err(malformed(format!("unsupported sample size {d}"))),
            };
            (codec, count(union, "channel count")?, packets)
        }
        other => return Err(malformed(format!("unsupported sound header encoding 0x{other:02X}"))),
    };
    let channels = u16::try_from(channels)
        .map_err(|_| malformed(format!("{channels} channels")))?;

    let (samples, bits, opaque) = match codec_info(&codec) {
        Some(info) => {
            let len = usize::from(channels) * packets as usize * info.bytes_per_packet;
            let samples = r.bytes(len)?;
            #[cfg(feature = "logging")]
            if !r.is_empty() {
                warn!("{} trailing bytes after sound data", r.remaining());
            }
            (samples, info.bits, false)
        }
        None => {
            #[cfg(feature = "logging")]
            warn!(
                "Unknown sound codec {:?}, copying {} bytes verbatim",
                String::from_utf8_lossy(&codec),
                r.remaining()
            );
            (r.rest(), 0, true)
        }
    };

    #[cfg(feature = "logging")]
    debug!(
        "Sound: {} ch, {} packets, codec {:?}, {} bytes",
        channels,
        packets,
        String::from_utf8_lossy(&codec),
        samples.len()
    );

    Ok(AiffSound {
        codec,
        opaque,
        sample_rate: f64::from(rate_fixed) / 65536.0,
        channels,
        frames: packets,
        bits,
        loop_start,
        loop_end,
        base_note,
        name,
        samples: Bytes::copy_from_slice(samples),
    })
}

/// Decode `snd ` into an AIFF-C artifact
pub fn decode_snd(res: &Resource, _ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    parse_snd(&res.data, res.name.clone()).map(ConvertedArtifact::AiffC)
}
