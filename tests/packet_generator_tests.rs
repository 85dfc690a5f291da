//! Tests for the packet generator and its signal models

use voltcap::{
    AsciiHeader, HeapLayout, PacketGenerator, PacketLayout, RandomSignal, SignalModel, SineWave,
    UdpPacketLayout,
};

/// 64 B packet header, 4 channels x 8 samples, one weight per 4 samples
fn udp_layout() -> UdpPacketLayout {
    UdpPacketLayout::new(64, 4, 8, 4, 8, 16).unwrap()
}

fn header() -> AsciiHeader {
    AsciiHeader::parse("NCHAN 16\nNBIT 8\nNPOL 2\nNDIM 2\nSEED 42\n").unwrap()
}

fn configured(model: Box<dyn SignalModel>) -> PacketGenerator<UdpPacketLayout> {
    let mut generator = PacketGenerator::new(udp_layout(), model);
    generator.configure(&header()).unwrap();
    generator
}

fn random_model() -> Box<dyn SignalModel> {
    Box::new(RandomSignal::new())
}

fn sine_model() -> Box<dyn SignalModel> {
    Box::new(SineWave::new())
}

fn models() -> [fn() -> Box<dyn SignalModel>; 2] {
    [random_model, sine_model]
}

fn fill_packets(generator: &mut PacketGenerator<UdpPacketLayout>, count: usize) -> Vec<Vec<u8>> {
    let size = generator.layout().packet_size();
    (0..count)
        .map(|_| {
            let mut packet = vec![0u8; size];
            generator.fill_packet(&mut packet).unwrap();
            packet
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layout_geometry() {
        let layout = udp_layout();
        assert_eq!(layout.scales_offset(), 64);
        assert_eq!(layout.scales_size(), 4);
        assert_eq!(layout.weights_offset(), 68);
        assert_eq!(layout.weights_size(), 16);
        assert_eq!(layout.data_offset(), 84);
        assert_eq!(layout.data_size(), 128);
        assert_eq!(layout.packet_size(), 212);
    }

    #[test]
    fn test_unconfigured_generator_is_state_error() {
        let mut generator = PacketGenerator::new(udp_layout(), Box::new(RandomSignal::new()));
        let mut packet = vec![0u8; 212];

        assert!(!generator.is_configured());
        assert!(generator.fill_packet(&mut packet).unwrap_err().is_state());
        assert!(generator.test_packet(&packet).unwrap_err().is_state());
        assert!(generator.packets_per_heap().unwrap_err().is_state());
        assert!(generator.weights_packet_stride().unwrap_err().is_state());
    }

    #[test]
    fn test_geometry_after_configure() {
        let generator = configured(Box::new(RandomSignal::new()));
        assert_eq!(generator.packets_per_heap().unwrap(), 4);
        assert_eq!(generator.block_scales_offset().unwrap(), 0);
        assert_eq!(generator.block_weights_offset().unwrap(), 4);
        assert_eq!(generator.weights_packet_stride().unwrap(), 20);
        assert_eq!(generator.data_packet_stride().unwrap(), 128);
    }

    #[test]
    fn test_round_trip_for_each_model() {
        for model in models() {
            let mut writer = configured(model());
            let packets = fill_packets(&mut writer, 10);
            assert_eq!(writer.packets_filled(), 10);

            let mut reader = configured(model());
            for packet in &packets {
                assert!(reader.test_packet(packet).unwrap());
            }
            assert_eq!(reader.packets_tested(), 10);
        }
    }

    #[test]
    fn test_random_packets_differ() {
        let mut generator = configured(Box::new(RandomSignal::new()));
        let packets = fill_packets(&mut generator, 2);
        assert_ne!(packets[0][84..], packets[1][84..]);
    }

    #[test]
    fn test_out_of_order_packet_fails() {
        for model in models() {
            let mut writer = configured(model());
            let packets = fill_packets(&mut writer, 2);

            let mut reader = configured(model());
            assert!(!reader.test_packet(&packets[1]).unwrap());
            assert_eq!(reader.packets_tested(), 1);
        }
    }

    #[test]
    fn test_seek_checks_any_packet() {
        let mut writer = configured(Box::new(RandomSignal::new()));
        let packets = fill_packets(&mut writer, 8);

        let mut reader = configured(Box::new(RandomSignal::new()));
        reader.seek(5);
        assert!(reader.test_packet(&packets[5]).unwrap());
        assert!(reader.test_packet(&packets[6]).unwrap());
        reader.reset();
        assert!(reader.test_packet(&packets[0]).unwrap());
    }

    #[test]
    fn test_corrupt_region_fails_for_each_model() {
        // one byte inside scales, weights and data respectively
        for index in [65, 70, 150] {
            for model in models() {
                let mut writer = configured(model());
                let mut packets = fill_packets(&mut writer, 1);
                packets[0][index] ^= 0x01;

                let mut reader = configured(model());
                assert!(!reader.test_packet(&packets[0]).unwrap(), "byte {}", index);
            }
        }
    }

    #[test]
    fn test_packet_header_bytes_are_ignored() {
        let mut writer = configured(Box::new(RandomSignal::new()));
        let mut packets = fill_packets(&mut writer, 1);
        packets[0][..64].fill(0xaa);

        let mut reader = configured(Box::new(RandomSignal::new()));
        assert!(reader.test_packet(&packets[0]).unwrap());
    }

    #[test]
    fn test_different_seed_fails() {
        let mut writer = configured(Box::new(RandomSignal::new()));
        let packets = fill_packets(&mut writer, 1);

        let mut reader = PacketGenerator::new(udp_layout(), Box::new(RandomSignal::new()));
        let mut other = header();
        other.set("SEED", 43);
        reader.configure(&other).unwrap();
        assert!(!reader.test_packet(&packets[0]).unwrap());
    }

    #[test]
    fn test_sine_scales_and_weights() {
        let mut generator = configured(Box::new(SineWave::new()));
        let packets = fill_packets(&mut generator, 1);
        assert_eq!(packets[0][64..68], 1.0f32.to_be_bytes());
        assert!(packets[0][68..84].iter().all(|&b| b == 0xff));
    }

    #[test]
    fn test_configure_validation() {
        let cases = [("NDIM", 1u32), ("NPOL", 1), ("NCHAN", 10), ("NCHAN", 0)];
        for (field, value) in cases {
            let mut bad = header();
            bad.set(field, value);
            let mut generator = PacketGenerator::new(udp_layout(), Box::new(RandomSignal::new()));
            let err = generator.configure(&bad).unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.field(), Some(field));
            assert!(!generator.is_configured());
        }
    }

    #[test]
    fn test_random_model_needs_a_seed() {
        let mut bad = header();
        bad.del("SEED");
        let mut generator = PacketGenerator::new(udp_layout(), Box::new(RandomSignal::new()));
        assert_eq!(generator.configure(&bad).unwrap_err().field(), Some("UTC_START"));

        bad.set("UTC_START", "2024-06-01-12:00:00");
        generator.configure(&bad).unwrap();
    }

    #[test]
    fn test_sine_model_needs_supported_nbit() {
        let mut bad = header();
        bad.set("NBIT", 4);
        let mut generator = PacketGenerator::new(udp_layout(), Box::new(SineWave::new()));
        assert_eq!(generator.configure(&bad).unwrap_err().field(), Some("NBIT"));
    }

    #[test]
    fn test_failed_configure_keeps_previous_geometry() {
        let mut generator = configured(Box::new(RandomSignal::new()));
        let mut bad = header();
        bad.set("NCHAN", 6);

        assert!(generator.configure(&bad).is_err());
        assert!(generator.is_configured());
        assert_eq!(generator.packets_per_heap().unwrap(), 4);
    }

    #[test]
    fn test_set_model_requires_configure() {
        let mut generator = configured(Box::new(RandomSignal::new()));
        generator.set_model(Box::new(SineWave::new()));
        assert!(!generator.is_configured());

        generator.configure(&header()).unwrap();
        let packets = fill_packets(&mut generator, 1);
        assert_eq!(packets[0][68], 0xff);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let mut generator = configured(Box::new(RandomSignal::new()));
        let mut packet = vec![0u8; 211];
        assert!(generator.fill_packet(&mut packet).unwrap_err().is_validation());
        assert_eq!(generator.packets_filled(), 0);

        let mut data = vec![0u8; 128];
        let mut weights = vec![0u8; 19];
        assert_eq!(
            generator.fill_split_packet(&mut data, &mut weights).unwrap_err().field(),
            Some("weights")
        );
    }

    #[test]
    fn test_split_packets_round_trip() {
        let mut writer = configured(Box::new(RandomSignal::new()));
        let mut data = vec![0u8; 128];
        let mut weights = vec![0u8; 20];
        writer.fill_split_packet(&mut data, &mut weights).unwrap();

        let mut reader = configured(Box::new(RandomSignal::new()));
        assert!(reader.test_split_packet(&data, &weights).unwrap());

        weights[0] ^= 0x80;
        reader.reset();
        assert!(!reader.test_split_packet(&data, &weights).unwrap());
    }

    #[test]
    fn test_split_and_whole_packets_carry_the_same_content() {
        let mut whole = configured(Box::new(RandomSignal::new()));
        let packets = fill_packets(&mut whole, 1);

        let mut split = configured(Box::new(RandomSignal::new()));
        let mut data = vec![0u8; 128];
        let mut weights = vec![0u8; 20];
        split.fill_split_packet(&mut data, &mut weights).unwrap();

        assert_eq!(&packets[0][64..84], &weights[..]);
        assert_eq!(&packets[0][84..212], &data[..]);
    }

    #[test]
    fn test_heaps_from_heap_layout() {
        let data_header = AsciiHeader::parse(
            "NCHAN 16\nUDP_NCHAN 4\nUDP_NSAMP 8\nWT_NSAMP 4\nNBIT 16\nNPOL 2\nNDIM 2\nSEED 7\n",
        )
        .unwrap();
        let weights_header = AsciiHeader::parse(
            "NCHAN 16\nUDP_NCHAN 4\nUDP_NSAMP 8\nWT_NSAMP 4\nNBIT 16\nNPOL 1\nNDIM 1\n",
        )
        .unwrap();
        let layout = HeapLayout::configure(&data_header, &weights_header).unwrap();

        for model in models() {
            let mut writer = PacketGenerator::new(*layout.packet_layout(), model());
            writer.configure(&data_header).unwrap();
            assert_eq!(writer.data_packet_stride().unwrap(), layout.data_packet_stride());
            assert_eq!(writer.weights_packet_stride().unwrap(), layout.weights_packet_stride());

            let mut data = vec![0u8; 2 * layout.data_heap_stride()];
            let mut weights = vec![0u8; 2 * layout.weights_heap_stride()];
            let (data0, data1) = data.split_at_mut(layout.data_heap_stride());
            let (weights0, weights1) = weights.split_at_mut(layout.weights_heap_stride());
            writer.fill_heap(data0, weights0).unwrap();
            writer.fill_heap(data1, weights1).unwrap();
            assert_eq!(writer.packets_filled(), 8);

            let mut reader = PacketGenerator::new(*layout.packet_layout(), model());
            reader.configure(&data_header).unwrap();
            let (data0, data1) = data.split_at(layout.data_heap_stride());
            let (weights0, weights1) = weights.split_at(layout.weights_heap_stride());
            assert!(reader.test_heap(data0, weights0).unwrap());
            assert!(reader.test_heap(data1, weights1).unwrap());
            assert_eq!(reader.packets_tested(), 8);
        }
    }

    #[test]
    fn test_corrupt_heap_advances_whole_heap() {
        let mut writer = configured(Box::new(RandomSignal::new()));
        let mut data = vec![0u8; 4 * 128];
        let mut weights = vec![0u8; 4 * 20];
        writer.fill_heap(&mut data, &mut weights).unwrap();

        weights[2 * 20 + 10] ^= 0xff;
        let mut reader = configured(Box::new(RandomSignal::new()));
        assert!(!reader.test_heap(&data, &weights).unwrap());
        assert_eq!(reader.packets_tested(), 4);
    }

    proptest! {
        #[test]
        fn prop_any_flipped_byte_is_detected(
            index in 64usize..212,
            mask in 1u8..=255,
            use_sine in any::<bool>(),
        ) {
            let model = if use_sine { sine_model } else { random_model };
            let mut writer = configured(model());
            let mut packets = fill_packets(&mut writer, 3);
            packets[1][index] ^= mask;

            let mut reader = configured(model());
            prop_assert!(reader.test_packet(&packets[0]).unwrap());
            prop_assert!(!reader.test_packet(&packets[1]).unwrap());
            prop_assert!(reader.test_packet(&packets[2]).unwrap());
        }
    }
}
