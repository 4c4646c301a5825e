// Based on https://github.com/Rahix/avr-hal/blob/main/examples/arduino-uno/src/bin/uno-panic.rs
// License MIT

/// Report the panic location on the serial console and halt.
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    // The main loop is gone; nothing else will touch the peripherals.
    avr_device::interrupt::disable();

    // SAFETY: we're never returning so stealing the peripherals is ok
    let dp = unsafe { arduino_hal::Peripherals::steal() };
    let pins = arduino_hal::pins!(dp);
    let mut serial = arduino_hal::default_serial!(dp, pins, 19200);

    ufmt::uwriteln!(&mut serial, "clock05 panic\r").ok();
    if let Some(loc) = info.location() {
        ufmt::uwriteln!(
            &mut serial,
            " at {}:{}:{}\r",
            loc.file(),
            loc.line(),
            loc.column(),
        )
        .ok();
    }
    loop {
        avr_device::asm::sleep();
    }
}
