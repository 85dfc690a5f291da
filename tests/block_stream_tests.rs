//! Tests for file-backed block streams, single and paired

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use voltcap::{
    AccessMode, AsciiHeader, BlockLoader, BlockProducer, BlockStream, CaptureFileWriter,
    DataWeightsBlockLoader, DataWeightsBlockProducer, DataWeightsStream, FileBlockLoader,
    FileBlockProducer, FileSegmentProducer, StreamConfig,
};

/// Data heap: 2 packets of 4 channels x 4 samples x 2 pol x 2 dim x 8 bit
const DATA_HEAP: usize = 128;
/// Weights heap: 2 packets of 4 B scales + 8 weights x 16 bit
const WEIGHTS_HEAP: usize = 40;

const SHARED: &str = "NCHAN 8\nUDP_NCHAN 4\nUDP_NSAMP 4\nWT_NSAMP 2\n";

fn data_header(obs_offset: u64) -> AsciiHeader {
    AsciiHeader::parse(&format!(
        "HDR_SIZE 4096\nOBS_OFFSET {}\n{}NBIT 8\nNPOL 2\nNDIM 2\n",
        obs_offset, SHARED
    ))
    .unwrap()
}

fn weights_header(obs_offset: u64) -> AsciiHeader {
    AsciiHeader::parse(&format!(
        "HDR_SIZE 4096\nOBS_OFFSET {}\n{}NBIT 16\nNPOL 1\nNDIM 1\n",
        obs_offset, SHARED
    ))
    .unwrap()
}

fn payload(len: usize, salt: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(salt)).collect()
}

fn write_capture(dir: &Path, name: &str, header: &AsciiHeader, payload: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = CaptureFileWriter::create(&path, header).unwrap();
    writer.write_block(payload).unwrap();
    writer.finish().unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_hands_out_whole_payload_once() {
        let dir = TempDir::new().unwrap();
        let bytes = payload(3000, 7);
        let path = write_capture(dir.path(), "data.dada", &data_header(256), &bytes);

        let mut producer = FileBlockProducer::open(&path).unwrap();
        assert_eq!(producer.access_mode(), AccessMode::ZeroCopy);
        assert_eq!(producer.payload_size(), 3000);
        assert_eq!(producer.header().get_u64("OBS_OFFSET").unwrap(), 256);

        let block = producer.next_block().unwrap();
        assert_eq!(block.data(), &bytes[..]);
        assert_eq!(block.obs_offset(), 256);

        assert!(producer.next_block().unwrap().is_end());
        assert!(producer.next_block().unwrap().is_end());
    }

    #[test]
    fn test_producer_header_only_file_ends_immediately() {
        let dir = TempDir::new().unwrap();
        let path = write_capture(dir.path(), "empty.dada", &data_header(0), &[]);

        let mut producer = FileBlockProducer::open(&path).unwrap();
        assert_eq!(producer.payload_size(), 0);
        assert!(producer.next_block().unwrap().is_end());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.dada");

        assert!(FileBlockProducer::open(&missing).unwrap_err().is_io());
        assert!(FileBlockLoader::open(&missing).unwrap_err().is_io());
    }

    #[test]
    fn test_zero_length_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zero.dada");
        std::fs::File::create(&path).unwrap();

        assert!(FileBlockProducer::open(&path).unwrap_err().is_io());
        assert!(FileBlockLoader::open(&path).unwrap_err().is_io());
    }

    #[test]
    fn test_truncated_header_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.dada");
        std::fs::write(&path, b"HDR_SIZE 4096\nOBS_OFFSET 0\n").unwrap();

        assert!(FileBlockProducer::open(&path).unwrap_err().is_io());
    }

    #[test]
    fn test_missing_obs_offset_is_rejected() {
        let dir = TempDir::new().unwrap();
        let header = AsciiHeader::parse("HDR_SIZE 4096\nNBIT 8\n").unwrap();
        let path = write_capture(dir.path(), "no_offset.dada", &header, &[1, 2, 3]);

        let err = FileBlockProducer::open(&path).unwrap_err();
        assert_eq!(err.field(), Some("OBS_OFFSET"));
    }

    #[test]
    fn test_loader_matches_producer() {
        let dir = TempDir::new().unwrap();
        let bytes = payload(10_000, 3);
        let path = write_capture(dir.path(), "data.dada", &data_header(1000), &bytes);

        let config = StreamConfig::new(&path).with_block_size(4096);
        let mut loader = FileBlockLoader::with_config(config).unwrap();
        assert_eq!(loader.access_mode(), AccessMode::Copying);
        assert_eq!(loader.block_size(), 4096);

        let mut collected = Vec::new();
        let mut offsets = Vec::new();
        loop {
            let block = loader.next_block().unwrap();
            if block.is_end() {
                break;
            }
            offsets.push(block.obs_offset());
            collected.extend_from_slice(block.data());
        }

        let producer = FileBlockProducer::open(&path).unwrap();
        assert_eq!(collected, producer.payload());
        assert_eq!(offsets, vec![1000, 5096, 9192]);
    }

    #[test]
    fn test_boxed_streams_share_one_interface() {
        let dir = TempDir::new().unwrap();
        let bytes = payload(512, 9);
        let path = write_capture(dir.path(), "data.dada", &data_header(0), &bytes);

        let streams: Vec<Box<dyn BlockStream>> = vec![
            Box::new(FileBlockProducer::open(&path).unwrap()),
            Box::new(FileBlockLoader::with_config(StreamConfig::new(&path).with_block_size(512)).unwrap()),
        ];
        for mut stream in streams {
            assert_eq!(stream.next_block().unwrap().data(), &bytes[..]);
            assert!(stream.next_block().unwrap().is_end());
        }
    }

    #[test]
    fn test_pair_requires_both_streams() {
        let dir = TempDir::new().unwrap();
        let path = write_capture(dir.path(), "data.dada", &data_header(0), &payload(DATA_HEAP, 1));

        let mut pair: DataWeightsBlockProducer = DataWeightsStream::new();
        assert!(!pair.is_initialised());
        assert!(pair.next_block().unwrap_err().is_state());
        assert!(pair.data_header().unwrap_err().is_state());
        assert!(pair.heap_layout().unwrap_err().is_state());

        pair.set_data_stream(FileBlockProducer::open(&path).unwrap()).unwrap();
        assert!(!pair.is_initialised());
        assert!(pair.data_stream().unwrap_err().is_state());
        assert!(pair.next_block().unwrap_err().is_state());
    }

    #[test]
    fn test_pair_delivers_matching_heaps() {
        let dir = TempDir::new().unwrap();
        let data = payload(3 * DATA_HEAP, 1);
        let weights = payload(3 * WEIGHTS_HEAP, 2);
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &data);
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &weights);

        let mut pair = DataWeightsBlockProducer::open(&data_path, &weights_path).unwrap();
        assert!(pair.is_initialised());
        assert_eq!(pair.heap_layout().unwrap().packets_per_heap(), 2);
        assert_eq!(pair.heap_layout().unwrap().data_heap_stride(), DATA_HEAP);
        assert_eq!(pair.heap_layout().unwrap().weights_heap_stride(), WEIGHTS_HEAP);

        let block = pair.next_block().unwrap();
        assert_eq!(block.data.data(), &data[..]);
        assert_eq!(block.weights.data(), &weights[..]);
        assert!(pair.next_block().unwrap().is_end());
    }

    #[test]
    fn test_pair_rejects_inconsistent_headers() {
        let dir = TempDir::new().unwrap();
        let mut weights_hdr = weights_header(0);
        weights_hdr.set("UDP_NCHAN", 8);
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &payload(DATA_HEAP, 1));
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_hdr, &payload(WEIGHTS_HEAP, 2));

        let err = DataWeightsBlockProducer::open(&data_path, &weights_path).unwrap_err();
        assert_eq!(err.field(), Some("UDP_NCHAN"));
    }

    #[test]
    fn test_failed_install_keeps_previous_pair() {
        let dir = TempDir::new().unwrap();
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &payload(DATA_HEAP, 1));
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &payload(WEIGHTS_HEAP, 2));
        let mut bad = weights_header(0);
        bad.set("WT_NSAMP", 4);
        let bad_path = write_capture(dir.path(), "bad.dada", &bad, &payload(WEIGHTS_HEAP, 2));

        let mut pair = DataWeightsBlockProducer::open(&data_path, &weights_path).unwrap();
        assert!(pair
            .set_weights_stream(FileBlockProducer::open(&bad_path).unwrap())
            .is_err());
        assert!(pair.is_initialised());
        assert_eq!(pair.weights_header().unwrap().get_u32("WT_NSAMP").unwrap(), 2);
    }

    #[test]
    fn test_pair_rejects_different_heap_counts() {
        let dir = TempDir::new().unwrap();
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &payload(2 * DATA_HEAP, 1));
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &payload(3 * WEIGHTS_HEAP, 2));

        let mut pair = DataWeightsBlockProducer::open(&data_path, &weights_path).unwrap();
        let err = pair.next_block().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field(), Some("stream length"));
    }

    #[test]
    fn test_pair_rejects_partial_heaps() {
        let dir = TempDir::new().unwrap();
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &payload(DATA_HEAP + 1, 1));
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &payload(WEIGHTS_HEAP, 2));

        let mut pair = DataWeightsBlockProducer::open(&data_path, &weights_path).unwrap();
        assert_eq!(pair.next_block().unwrap_err().field(), Some("data"));
    }

    #[test]
    fn test_pair_rejects_misaligned_start_heaps() {
        let dir = TempDir::new().unwrap();
        let data_path = write_capture(dir.path(), "data.dada", &data_header(DATA_HEAP as u64), &payload(DATA_HEAP, 1));
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &payload(WEIGHTS_HEAP, 2));

        let mut pair = DataWeightsBlockProducer::open(&data_path, &weights_path).unwrap();
        assert_eq!(pair.next_block().unwrap_err().field(), Some("OBS_OFFSET"));
    }

    #[test]
    fn test_loader_pair_steps_heap_by_heap() {
        let dir = TempDir::new().unwrap();
        let data = payload(4 * DATA_HEAP, 1);
        let weights = payload(4 * WEIGHTS_HEAP, 2);
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &data);
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &weights);

        let mut pair = DataWeightsBlockLoader::open(&data_path, &weights_path, 2).unwrap();
        assert_eq!(pair.data_stream().unwrap().block_size(), 2 * DATA_HEAP);
        assert_eq!(pair.weights_stream().unwrap().block_size(), 2 * WEIGHTS_HEAP);

        for step in 0..2 {
            let block = pair.next_block().unwrap();
            assert_eq!(block.data.data(), &data[step * 2 * DATA_HEAP..(step + 1) * 2 * DATA_HEAP]);
            assert_eq!(
                block.weights.data(),
                &weights[step * 2 * WEIGHTS_HEAP..(step + 1) * 2 * WEIGHTS_HEAP]
            );
            assert_eq!(block.data.obs_offset(), (step * 2 * DATA_HEAP) as u64);
        }
        assert!(pair.next_block().unwrap().is_end());
    }

    #[test]
    fn test_loader_pair_rejects_zero_heaps() {
        let dir = TempDir::new().unwrap();
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &payload(DATA_HEAP, 1));
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &payload(WEIGHTS_HEAP, 2));

        let mut pair = DataWeightsBlockLoader::open(&data_path, &weights_path, 1).unwrap();
        assert!(pair.set_heaps_per_block(0).unwrap_err().is_validation());
    }

    #[test]
    fn test_loader_pair_detects_one_stream_ending_first() {
        let dir = TempDir::new().unwrap();
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &payload(2 * DATA_HEAP, 1));
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &payload(WEIGHTS_HEAP, 2));

        let mut pair = DataWeightsBlockLoader::open(&data_path, &weights_path, 1).unwrap();
        assert!(!pair.next_block().unwrap().is_end());
        let err = pair.next_block().unwrap_err();
        assert_eq!(err.field(), Some("stream length"));
        assert!(pair.is_failed());
        assert!(pair.next_block().unwrap_err().is_state());
    }

    #[test]
    fn test_pair_is_unusable_after_partial_heap() {
        let dir = TempDir::new().unwrap();
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &payload(2 * DATA_HEAP, 1));
        let short_path = write_capture(
            dir.path(),
            "short.dada",
            &weights_header(0),
            &payload(WEIGHTS_HEAP + WEIGHTS_HEAP / 2, 2),
        );
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &payload(2 * WEIGHTS_HEAP, 2));

        let mut pair = DataWeightsBlockLoader::open(&data_path, &short_path, 1).unwrap();
        assert!(!pair.next_block().unwrap().is_end());
        assert_eq!(pair.next_block().unwrap_err().field(), Some("weights"));
        assert!(pair.is_failed());
        assert!(pair.next_block().unwrap_err().is_state());

        pair.set_weights_stream(FileBlockLoader::open(&weights_path).unwrap()).unwrap();
        assert!(!pair.is_failed());
    }

    #[test]
    fn test_segment_producer() {
        let dir = TempDir::new().unwrap();
        let data = payload(5 * DATA_HEAP, 4);
        let weights = payload(5 * WEIGHTS_HEAP, 5);
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &data);
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &weights);

        let mut segments = FileSegmentProducer::open(&data_path, &weights_path).unwrap();
        assert_eq!(segments.heap_count(), 5);
        assert_eq!(segments.data_header().unwrap().get_u32("NBIT").unwrap(), 8);
        assert_eq!(segments.weights_header().unwrap().get_u32("NBIT").unwrap(), 16);

        let segment = segments.next_block().unwrap();
        assert_eq!(segment.data.data(), &data[..]);
        assert_eq!(segment.weights.data(), &weights[..]);
        assert!(segments.next_block().unwrap().is_end());
    }

    #[test]
    fn test_segment_producer_rejects_mismatched_files() {
        let dir = TempDir::new().unwrap();
        let data_path = write_capture(dir.path(), "data.dada", &data_header(0), &payload(2 * DATA_HEAP, 4));
        let weights_path = write_capture(dir.path(), "weights.dada", &weights_header(0), &payload(WEIGHTS_HEAP, 5));

        let err = FileSegmentProducer::open(&data_path, &weights_path).unwrap_err();
        assert_eq!(err.field(), Some("stream length"));
    }
}
