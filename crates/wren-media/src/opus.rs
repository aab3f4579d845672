use crate::error::MediaError;
use crate::Result;

/// Duration and waveform summary for a voice-note carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpusAnalysis {
    pub seconds: u32,
    /// 64 bytes in [0, 100], deterministic for a given duration.
    pub waveform: Vec<u8>,
}

const OGG_MAGIC: &[u8] = b"OggS";
const OPUS_HEAD: &[u8] = b"OpusHead";
const WAVEFORM_LEN: usize = 64;
const MAX_SECONDS: u32 = 300;

/// Walks the Ogg pages of an Opus stream to derive its duration, then builds
/// the waveform summary the network expects on PTT messages.
pub fn analyze_ogg_opus(data: &[u8]) -> Result<OpusAnalysis> {
    if data.len() < 4 || &data[0..4] != OGG_MAGIC {
        return Err(MediaError::NotOgg);
    }

    let mut last_granule: u64 = 0;
    let mut sample_rate: u32 = 48_000;
    let mut pre_skip: u16 = 0;
    let mut found_head = false;

    let mut i = 0usize;
    while i < data.len() {
        if i + 27 >= data.len() {
            break;
        }
        if &data[i..i + 4] != OGG_MAGIC {
            i += 1;
            continue;
        }
        let granule = u64::from_le_bytes(slice8(&data[i + 6..i + 14]));
        let page_seq = u32::from_le_bytes(slice4(&data[i + 18..i + 22]));
        let num_segments = data[i + 26] as usize;
        if i + 27 + num_segments >= data.len() {
            break;
        }
        let segment_table = &data[i + 27..i + 27 + num_segments];
        let page_size =
            27 + num_segments + segment_table.iter().map(|&s| s as usize).sum::<usize>();

        if !found_head && page_seq <= 1 {
            let page_end = (i + page_size).min(data.len());
            let page = &data[i..page_end];
            if let Some(pos) = find(page, OPUS_HEAD) {
                // OpusHead: magic(8) + version(1) + channels(1) + pre-skip(2) + rate(4)
                if pos + 16 <= page.len() {
                    pre_skip = u16::from_le_bytes([page[pos + 10], page[pos + 11]]);
                    sample_rate = u32::from_le_bytes(slice4(&page[pos + 12..pos + 16]));
                    found_head = true;
                }
            }
        }

        if granule != 0 {
            last_granule = granule;
        }
        i += page_size;
    }

    let seconds = if last_granule > 0 {
        let samples = last_granule.saturating_sub(u64::from(pre_skip));
        (samples as f64 / f64::from(sample_rate)).ceil() as u32
    } else {
        (data.len() as f64 / 2000.0) as u32
    };
    let seconds = seconds.clamp(1, MAX_SECONDS);

    Ok(OpusAnalysis {
        seconds,
        waveform: waveform_for(seconds),
    })
}

/// Cosmetic waveform: two sine harmonics with an index-keyed dither, shaped
/// by an envelope. Depends only on the duration so replays are identical.
fn waveform_for(seconds: u32) -> Vec<u8> {
    use std::f64::consts::PI;

    let freq = f64::from(seconds.min(120)) / 30.0;
    let mut waveform = Vec::with_capacity(WAVEFORM_LEN);
    for i in 0..WAVEFORM_LEN {
        let pos = i as f64 / WAVEFORM_LEN as f64;
        let mut val =
            35.0 * (pos * PI * freq * 8.0).sin() + 17.5 * (pos * PI * freq * 16.0).sin();
        let dither = (i as u32)
            .wrapping_mul(31)
            .wrapping_add(seconds.wrapping_mul(17))
            % 15;
        val += f64::from(dither) - 7.0;
        val = val * (0.7 + 0.3 * (pos * PI).sin()) + 50.0;
        waveform.push(val.clamp(0.0, 100.0) as u8);
    }
    waveform
}

fn slice4(s: &[u8]) -> [u8; 4] {
    [s[0], s[1], s[2], s[3]]
}

fn slice8(s: &[u8]) -> [u8; 8] {
    [s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]]
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a single Ogg page with one segment lace per 255 bytes of body.
    fn ogg_page(seq: u32, granule: u64, body: &[u8]) -> Vec<u8> {
        assert!(body.len() < 255, "test pages are single-lace");
        let mut page = Vec::new();
        page.extend_from_slice(b"OggS");
        page.push(0); // version
        page.push(0); // header type
        page.extend_from_slice(&granule.to_le_bytes());
        page.extend_from_slice(&1u32.to_le_bytes()); // serial
        page.extend_from_slice(&seq.to_le_bytes());
        page.extend_from_slice(&0u32.to_le_bytes()); // checksum, unchecked
        page.push(1); // one segment
        page.push(body.len() as u8);
        page.extend_from_slice(body);
        page
    }

    fn opus_head(pre_skip: u16, sample_rate: u32) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"OpusHead");
        body.push(1); // version
        body.push(1); // channels
        body.extend_from_slice(&pre_skip.to_le_bytes());
        body.extend_from_slice(&sample_rate.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes()); // gain
        body.push(0); // mapping family
        body
    }

    fn stream_of(seconds: u64, pre_skip: u16, sample_rate: u32) -> Vec<u8> {
        let mut data = ogg_page(0, 0, &opus_head(pre_skip, sample_rate));
        let granule = seconds * u64::from(sample_rate) + u64::from(pre_skip);
        data.extend_from_slice(&ogg_page(2, granule, &[0u8; 64]));
        data
    }

    #[test]
    fn duration_matches_granule_position() {
        for seconds in [1u64, 7, 42, 299] {
            let analysis = analyze_ogg_opus(&stream_of(seconds, 312, 48_000)).unwrap();
            assert!(
                (i64::from(analysis.seconds) - seconds as i64).abs() <= 1,
                "expected ~{seconds}s, got {}",
                analysis.seconds
            );
        }
    }

    #[test]
    fn non_default_sample_rate_is_honoured() {
        let analysis = analyze_ogg_opus(&stream_of(10, 0, 24_000)).unwrap();
        assert_eq!(analysis.seconds, 10);
    }

    #[test]
    fn duration_clamps_to_five_minutes() {
        let analysis = analyze_ogg_opus(&stream_of(5000, 0, 48_000)).unwrap();
        assert_eq!(analysis.seconds, 300);
    }

    #[test]
    fn missing_granule_estimates_from_size() {
        // A lone header page with no audio pages.
        let data = ogg_page(0, 0, &opus_head(0, 48_000));
        let analysis = analyze_ogg_opus(&data).unwrap();
        assert_eq!(analysis.seconds, 1);
    }

    #[test]
    fn rejects_non_ogg_bytes() {
        assert!(matches!(
            analyze_ogg_opus(b"ID3\x04rest of an mp3"),
            Err(MediaError::NotOgg)
        ));
        assert!(matches!(analyze_ogg_opus(b"Og"), Err(MediaError::NotOgg)));
    }

    #[test]
    fn waveform_is_deterministic_and_bounded() {
        let a = analyze_ogg_opus(&stream_of(7, 0, 48_000)).unwrap();
        let b = analyze_ogg_opus(&stream_of(7, 0, 48_000)).unwrap();
        assert_eq!(a.waveform, b.waveform);
        assert_eq!(a.waveform.len(), 64);
        assert!(a.waveform.iter().all(|&v| v <= 100));
    }

    #[test]
    fn waveform_varies_with_duration() {
        let short = analyze_ogg_opus(&stream_of(3, 0, 48_000)).unwrap();
        let long = analyze_ogg_opus(&stream_of(60, 0, 48_000)).unwrap();
        assert_ne!(short.waveform, long.waveform);
    }
}
