#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_rp::usb::Driver;
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::Builder;
use portable_atomic::Ordering;
use static_cell::StaticCell;
use usb2serial::config::{
    CDC_PACKET_SIZE, CONTROL_PACKET_SIZE, DEFAULT_LINE_ENCODING, DESCRIPTOR_BUFFER_SIZE,
    PROGRAMMER_ENDPOINTS, STRAP_POLARITY, UART_QUEUE_SIZE, UART_TX_GPIO,
};
use usb2serial::leds::Leds;
use usb2serial::uart::{enable_rx_interrupt, install_rx_producer, Pl011, USB_CONFIGURED};
use usb2serial::usb_cdc::CdcSerial;
use usb2serial::usb_programmer::configure_programmer;
use usb2serial::usb_setup::{device_config, UsbStateHandler, UsbStrings};
use usb2serial::{AppSession, UsbDriver};
use usb2serial_core::{
    BridgeEngine, BridgeQueues, ByteQueue, ModeLatch, OperatingMode, ProgrammerDispatch, ResetLine,
    SerialLineController, Session, UnknownCommandResponder,
};
use usb2serial_descriptors::{BridgeCatalog, ProgrammerCatalog};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Operating mode, decided once at boot.
static MODE: ModeLatch = ModeLatch::new();

/// Bridge queues: host-to-UART and UART-to-host.
static TO_UART: StaticCell<ByteQueue<UART_QUEUE_SIZE>> = StaticCell::new();
static TO_HOST: StaticCell<ByteQueue<UART_QUEUE_SIZE>> = StaticCell::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; DESCRIPTOR_BUFFER_SIZE]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; DESCRIPTOR_BUFFER_SIZE]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; DESCRIPTOR_BUFFER_SIZE]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; CONTROL_PACKET_SIZE]> = StaticCell::new();

static USB_STRINGS: StaticCell<UsbStrings> = StaticCell::new();
static USB_HANDLER: StaticCell<UsbStateHandler> = StaticCell::new();

/// CDC-ACM state.
static CDC_STATE: StaticCell<State> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("usb2serial starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Mode strap ---
    let mode = {
        let mut strap = Input::new(p.PIN_2, Pull::Up);
        MODE.select(&mut strap, &mut embassy_time::Delay, STRAP_POLARITY)
    };

    let leds = Leds::new(
        Output::new(p.PIN_14, Level::Low),
        Output::new(p.PIN_15, Level::Low),
        Output::new(p.PIN_25, Level::Low),
    );

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);
    let strings = USB_STRINGS.init(UsbStrings::new());
    let usb_config = match mode {
        OperatingMode::Bridge => device_config(&mut BridgeCatalog::new(), strings),
        OperatingMode::Programmer => {
            device_config(&mut ProgrammerCatalog::new(PROGRAMMER_ENDPOINTS), strings)
        }
    };

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; DESCRIPTOR_BUFFER_SIZE]),
        BOS_DESCRIPTOR.init([0; DESCRIPTOR_BUFFER_SIZE]),
        MSOS_DESCRIPTOR.init([0; DESCRIPTOR_BUFFER_SIZE]),
        CONTROL_BUF.init([0; CONTROL_PACKET_SIZE]),
    );
    builder.handler(USB_HANDLER.init(UsbStateHandler));

    let session: AppSession = match mode {
        OperatingMode::Bridge => {
            let (to_uart_in, to_uart_out) = TO_UART.init(ByteQueue::new()).split();
            let (rx_producer, to_host) = TO_HOST.init(ByteQueue::new()).split();
            install_rx_producer(rx_producer);

            // --- UART Setup ---
            let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
            let pl011 = Pl011::new(uart, UART_TX_GPIO, embassy_rp::clocks::clk_peri_freq());
            let line = SerialLineController::new(pl011, DEFAULT_LINE_ENCODING);
            enable_rx_interrupt();

            let reset = ResetLine::new(Output::new(p.PIN_3, Level::High));

            let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), CDC_PACKET_SIZE);
            let serial = CdcSerial::new(class, DEFAULT_LINE_ENCODING);

            Session::Bridge(BridgeEngine::new(
                serial,
                line,
                reset,
                leds,
                BridgeQueues {
                    to_uart: (to_uart_in, to_uart_out),
                    to_host,
                },
            ))
        }
        OperatingMode::Programmer => {
            let port = configure_programmer(&mut builder, PROGRAMMER_ENDPOINTS);
            Session::Programmer(ProgrammerDispatch::new(
                port,
                UnknownCommandResponder,
                leds,
                ProgrammerCatalog::new(PROGRAMMER_ENDPOINTS),
            ))
        }
    };

    // Build the USB device
    let usb_device = builder.build();

    // Spawn tasks
    spawner.spawn(usb_task(usb_device)).unwrap();
    spawner.spawn(session_task(session)).unwrap();

    info!("usb2serial initialized in {} mode", mode);
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, UsbDriver<'static>>) {
    device.run().await;
}

/// Session task - polls the active personality.
#[embassy_executor::task]
async fn session_task(mut session: AppSession) {
    let mut configured = false;
    loop {
        let now = USB_CONFIGURED.load(Ordering::Relaxed);
        if now != configured {
            configured = now;
            session.set_configured(now);
        }

        session.tick();
        yield_now().await;
    }
}
