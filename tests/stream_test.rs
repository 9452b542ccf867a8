use bytechain::{BufferChain, ByteBuffer, ByteStream, StringEncoding};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// Build a minimal RIFF/WAVE header with a single `fmt ` chunk, the way a
/// format writer would: placeholder size first, patched before commit.
fn build_wave_header(sample_rate: u32, channels: u16) -> ByteBuffer {
    let mut builder = ByteBuffer::builder();
    builder.write_string("RIFF", StringEncoding::Ascii);
    builder.write_u32(0, true); // patched below
    builder.write_string("WAVE", StringEncoding::Ascii);

    builder.write_string("fmt ", StringEncoding::Ascii);
    builder.write_u32(16, true);
    builder.write_u16(1, true); // PCM
    builder.write_u16(channels, true);
    builder.write_u32(sample_rate, true);
    builder.write_u32(sample_rate * u32::from(channels) * 2, true);
    builder.write_u16(channels * 2, true);
    builder.write_u16(16, true);

    let end = builder.position();
    builder.seek(4);
    builder.write_u32(end as u32 - 8, true);
    builder.seek(end);
    builder.commit()
}

#[test]
fn wave_header_round_trip() {
    let header = build_wave_header(44100, 2);
    let mut stream = ByteStream::from_buffer(header);

    assert!(stream.next(b"RIFF"));
    assert_eq!(
        stream.read_string(Some(4), StringEncoding::Ascii).unwrap(),
        "RIFF"
    );
    let riff_size = stream.read_u32(true).unwrap();
    assert_eq!(riff_size, 28); // 36-byte header minus the RIFF tag and size
    assert_eq!(
        stream.read_string(Some(4), StringEncoding::Ascii).unwrap(),
        "WAVE"
    );

    assert_eq!(
        stream.read_string(Some(4), StringEncoding::Ascii).unwrap(),
        "fmt "
    );
    assert_eq!(stream.read_u32(true).unwrap(), 16);
    assert_eq!(stream.read_u16(true).unwrap(), 1);
    assert_eq!(stream.read_u16(true).unwrap(), 2);
    assert_eq!(stream.read_u32(true).unwrap(), 44100);
    assert_eq!(stream.read_u32(true).unwrap(), 44100 * 4);
    assert_eq!(stream.read_u16(true).unwrap(), 4);
    assert_eq!(stream.read_u16(true).unwrap(), 16);
    assert_eq!(stream.remaining_bytes(), 0);
}

#[test]
fn parses_identically_from_a_split_chain() {
    let header = build_wave_header(22050, 1);
    let bytes = header.as_bytes().to_vec();

    // Feed the same header in awkward 5-byte pieces, as if streamed in.
    let mut chain = BufferChain::new();
    for piece in bytes.chunks(5) {
        chain.append(ByteBuffer::from(piece));
    }
    let mut stream = ByteStream::new(chain);

    assert_eq!(
        stream.read_string(Some(4), StringEncoding::Ascii).unwrap(),
        "RIFF"
    );
    stream.advance(4).unwrap();
    assert_eq!(
        stream.read_string(Some(4), StringEncoding::Ascii).unwrap(),
        "WAVE"
    );
    stream.advance(8).unwrap(); // "fmt " + chunk size
    stream.advance(2).unwrap(); // format tag
    assert_eq!(stream.read_u16(true).unwrap(), 1);
    assert_eq!(stream.read_u32(true).unwrap(), 22050);
}

#[test]
fn temp_file_round_trip() {
    let header = build_wave_header(48000, 2);

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(header.as_bytes()).unwrap();
    file.flush().unwrap();

    let bytes = fs::read(file.path()).unwrap();
    let mut stream = ByteStream::from_bytes(bytes);

    assert!(stream.next(b"RIFF"));
    stream.advance(8).unwrap();
    assert!(stream.next(b"WAVE"));
    assert_eq!(stream.peek_u32(24, true).unwrap(), 48000);
    // The stream has not moved while peeking.
    assert_eq!(stream.offset(), 8);
}

#[test]
fn speculative_parse_rolls_back() {
    let header = build_wave_header(44100, 2);
    let mut stream = ByteStream::from_buffer(header);
    stream.advance(12).unwrap(); // position at the first chunk tag

    // Try an optional chunk type against a copy; fall back on mismatch.
    let mut speculative = stream.copy();
    let tag = speculative
        .read_string(Some(4), StringEncoding::Ascii)
        .unwrap();
    if tag == "data" {
        panic!("unexpected tag");
    }
    // The mainline stream still sits at the tag.
    assert_eq!(
        stream.read_string(Some(4), StringEncoding::Ascii).unwrap(),
        "fmt "
    );
}

#[test]
fn appending_chunks_mid_parse() {
    let header = build_wave_header(44100, 2);
    let bytes = header.as_bytes().to_vec();
    let (first_half, second_half) = bytes.split_at(10);

    let mut chain = BufferChain::new();
    chain.append(ByteBuffer::from(first_half));
    let mut stream = ByteStream::new(chain);

    assert_eq!(
        stream.read_string(Some(4), StringEncoding::Ascii).unwrap(),
        "RIFF"
    );
    assert!(!stream.available(8));

    // More file data arrives.
    stream.chain.append(ByteBuffer::from(second_half));
    stream.advance(4).unwrap();
    assert_eq!(
        stream.read_string(Some(4), StringEncoding::Ascii).unwrap(),
        "WAVE"
    );
}
