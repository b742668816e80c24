use blueid::address::DEFAULT_PUBLIC_ADDRESS;
use blueid::{AdvertisingConfig, AdvertisingPolicy, CommandChannel, DeviceAddress, HciSocket, Peripheral};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional address argument, e.g. C0:FF:EE:00:00:01
    let address = match std::env::args().nth(1) {
        Some(text) => text.parse::<DeviceAddress>()?,
        None => DEFAULT_PUBLIC_ADDRESS,
    };

    let socket = match HciSocket::open(0) {
        Ok(socket) => socket,
        Err(e) => {
            eprintln!("Failed to open HCI socket: {}", e);
            eprintln!("This might be because:");
            eprintln!("1. No Bluetooth adapter is available");
            eprintln!("2. The adapter does not support the vendor Write BD_ADDR command");
            eprintln!("3. You don't have sufficient permissions to access the Bluetooth device");
            return Err(e.into());
        }
    };

    let mut device = Peripheral::new(CommandChannel::new(socket), AdvertisingPolicy::default());
    device.bring_up(address, AdvertisingConfig::connectable_named("blueid-demo"))?;
    println!("Advertising as {}", address);

    // Report connection state changes for a minute
    for _ in 0..60 {
        device.process_events(Some(Duration::from_secs(1)))?;
        println!("state: {}", device.state());
    }

    Ok(())
}
