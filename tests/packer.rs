mod tests {
    use myrtio_city_lights::{BitPacker, Frame, LightVector, pack, unpack};

    fn bits(s: &str) -> LightVector {
        LightVector::parse(s).unwrap()
    }

    #[test]
    fn test_pack_single_chunk() {
        assert_eq!(pack(&bits("00000001")), vec![0x01]);
        assert_eq!(pack(&bits("10000000")), vec![0x80]);
        assert_eq!(pack(&bits("10100101")), vec![0xA5]);
    }

    #[test]
    fn test_pack_left_pads_first_chunk() {
        // 6 padding bits, then "10" in the first byte
        assert_eq!(pack(&bits("1000000001")), vec![0x02, 0x01]);
        assert_eq!(pack(&bits("111")), vec![0x07]);
    }

    #[test]
    fn test_pack_chunk_order() {
        assert_eq!(pack(&bits("1111000000001010")), vec![0xF0, 0x0A]);
    }

    #[test]
    fn test_pack_empty() {
        assert!(pack(&LightVector::zeroed(0)).is_empty());
    }

    #[test]
    fn test_repacking_is_deterministic() {
        let vector = bits("1011001110001");
        let mut packer = BitPacker::new();
        let first = packer.pack(&vector).to_vec();
        assert_eq!(packer.pack(&vector), first.as_slice());
        assert_eq!(pack(&vector), first);
    }

    #[test]
    fn test_buffer_is_reused_for_same_length() {
        let mut packer = BitPacker::new();
        let first = packer.pack(&bits("00000001")).as_ptr();
        let second = packer.pack(&bits("11110000")).as_ptr();

        assert_eq!(first, second);
        assert_eq!(packer.allocations(), 1);
        assert_eq!(packer.buffer(), &[0xF0]);
    }

    #[test]
    fn test_length_change_allocates_new_buffer() {
        let mut packer = BitPacker::new();
        let old = packer.pack(&bits("11111111")).as_ptr();
        assert_eq!(packer.bits(), Some(8));

        let bytes = packer.pack(&LightVector::zeroed(16));
        assert_eq!(bytes, &[0x00, 0x00]);
        assert_ne!(bytes.as_ptr(), old);
        assert_eq!(packer.bits(), Some(16));
        assert_eq!(packer.allocations(), 2);
    }

    #[test]
    fn test_unpack_restores_vector() {
        let vector = bits("1000000001");
        assert_eq!(unpack(&pack(&vector), vector.len()), Ok(vector));
        assert!(unpack(&[0x01], 10).is_err());
    }

    #[test]
    fn test_output_enable_duty_is_inverted() {
        let bytes = [0u8; 1];
        let duty = |brightness| Frame {
            bytes: &bytes,
            brightness,
        }
        .output_enable_duty();

        assert_eq!(duty(255), 0);
        assert_eq!(duty(0), 255);
        assert_eq!(duty(100), 155);
    }
}
