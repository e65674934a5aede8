use swd_wire::{
    dp, AckCode, FakeTarget, PortType, RegisterAddress, SwdEngine, SwdError, SwdSettings,
    Transport,
};

/// Writes followed by reads of the same register return the written value.
#[test]
fn write_then_read_round_trip() {
    let mut engine = SwdEngine::new(FakeTarget::new());

    for port in [PortType::DebugPort, PortType::AccessPort] {
        for index in 0..4 {
            let address = RegisterAddress::new(index);

            for value in [0, 1, u32::MAX, 0x8000_0001, rand::random(), rand::random()] {
                engine
                    .write_register(port, address, value)
                    .expect("Failed to write register");

                let read = engine
                    .read_register(port, address)
                    .expect("Failed to read register");

                assert_eq!(read, value, "{port:?} register {address}");
            }
        }
    }

    assert_eq!(engine.transport_mut().write_parity_errors(), 0);
}

#[test]
fn round_trip_with_parity_verification() {
    let settings = SwdSettings {
        verify_read_parity: true,
    };
    let mut engine = SwdEngine::with_settings(FakeTarget::new(), settings);

    for _ in 0..64 {
        let value: u32 = rand::random();

        engine
            .write_register(PortType::AccessPort, RegisterAddress::new(3), value)
            .expect("Failed to write register");

        assert_eq!(
            engine
                .read_register(PortType::AccessPort, RegisterAddress::new(3))
                .expect("Failed to read register"),
            value
        );
    }
}

/// Connection sequence used for a target on a multi-drop bus.
#[test]
fn connect_to_multidrop_target() {
    let target = FakeTarget::new().with_register(PortType::DebugPort, dp::DPIDR, 0x0BC1_2477);
    let mut engine = SwdEngine::new(target);

    engine.jtag_to_swd_switch().expect("Transport failed");
    engine
        .select_target(dp::TargetSel::new(0x0100_2927, 0))
        .expect("Transport failed");

    let id = engine.read_dpidr().expect("Failed to read DPIDR");
    assert_eq!(id.version, dp::DebugPortVersion::DPv2);

    let target = engine.into_transport();
    assert_eq!(target.selected_target(), Some(0x0100_2927));
    // Two from the switch sequence, one before TARGETSEL.
    assert_eq!(target.line_resets(), 3);
}

#[test]
fn caller_recovers_from_wait() {
    let mut target = FakeTarget::new();
    target.queue_ack(AckCode::Wait);

    let mut engine = SwdEngine::new(target);
    let address = RegisterAddress::new(1);

    let err = engine
        .write_register(PortType::AccessPort, address, 0x55)
        .unwrap_err();
    assert!(matches!(err, SwdError::Acknowledge(AckCode::Wait)));

    // Retrying is up to the caller.
    engine
        .write_register(PortType::AccessPort, address, 0x55)
        .expect("Second write failed");

    assert_eq!(
        engine
            .read_register(PortType::AccessPort, address)
            .expect("Read failed"),
        0x55
    );
}

#[test]
fn boxed_transport() {
    let transport: Box<dyn Transport> = Box::new(FakeTarget::new());
    let mut engine = SwdEngine::new(transport);

    engine.line_reset().expect("Transport failed");
    engine
        .write_register(PortType::DebugPort, dp::SELECT, 0x0100_00F0)
        .expect("Failed to write SELECT");
}
