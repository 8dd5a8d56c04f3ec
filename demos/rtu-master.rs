// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTU master example
//!
//! Usage: `rtu-master [TTY_PATH] [BAUD_RATE] [PARITY]`

fn main() -> Result<(), Box<dyn std::error::Error>> {
    use rtu_master::prelude::*;

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let tty_path = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_owned());
    let baud_rate = args.next().map(|s| s.parse()).transpose()?.unwrap_or(19200);
    let parity = args.next().map(|s| s.parse::<Parity>()).transpose()?.unwrap_or_default();
    let slave = Slave(0x17);

    let config = SerialConfig::new(tty_path).baud_rate(baud_rate).parity(parity);
    println!("Opening {config}");
    let master = Master::open(&config)?;

    println!("Reading a sensor value");
    let mut buf = [0; 4];
    let n = master.read_holding_registers(&mut buf, slave, 0x082B, 2, CrcOrder::default())?;
    println!("Sensor value is: {:?}", decode_words(&buf[..n])?);

    println!("Writing the set point");
    master.write_multiple_registers(slave, 0x0100, &[0x000A, 0x0102], CrcOrder::default())?;

    println!("Reading the status coils");
    let mut buf = [0; 2];
    let n = master.read_coils(&mut buf, slave, 0x0000, 10, CrcOrder::default())?;
    println!("Coils: {:?}", unpack_coils(&buf[..n], 10));

    master.close()?;
    Ok(())
}
