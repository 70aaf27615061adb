//! USB boot keyboard on the ATmega32U4's built-in USB controller.
//!
//! Only the transport lives here: enumeration, HID class requests, the
//! interrupt IN endpoint, start-of-frame detection and remote wakeup. What
//! goes into the reports is decided by `c64key_core`.

use avr_device::atmega32u4::Peripherals;
use c64key_core::report::REPORT_LEN;
use c64key_core::{HidTransport, RemoteWakeup, Report, USB_PID, USB_VID};

const EP0_SIZE: u8 = 64; // Control endpoint size
const EP1_SIZE: u8 = 8; // Interrupt IN endpoint size (keyboard reports)

/// Boot keyboard report descriptor: 8 modifier bits, a reserved byte,
/// 5 LED bits (output) and six usage slots up to 0x65.
static HID_REPORT_DESCRIPTOR: [u8; 63] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224) - LCtrl
    0x29, 0xE7, //   Usage Maximum (231) - RGui
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x03, //   Input (Constant)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x03, //   Output (Constant)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x65, //   Logical Maximum (101)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x65, //   Usage Maximum (101)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

static DEVICE_DESCRIPTOR: [u8; 18] = [
    18,   // bLength
    1,    // bDescriptorType (Device)
    0x10, 0x01, // bcdUSB (1.1)
    0,    // bDeviceClass (defined at interface level)
    0,    // bDeviceSubClass
    0,    // bDeviceProtocol
    EP0_SIZE, // bMaxPacketSize0
    USB_VID as u8, (USB_VID >> 8) as u8, // idVendor
    USB_PID as u8, (USB_PID >> 8) as u8, // idProduct
    0x98, 0x01, // bcdDevice (1.98)
    1,    // iManufacturer
    2,    // iProduct
    0,    // iSerialNumber
    1,    // bNumConfigurations
];

static CONFIG_DESCRIPTOR: [u8; 34] = [
    // Configuration descriptor
    9,    // bLength
    2,    // bDescriptorType (Configuration)
    34, 0, // wTotalLength
    1,    // bNumInterfaces
    1,    // bConfigurationValue
    0,    // iConfiguration
    0xA0, // bmAttributes (bus powered, remote wakeup)
    50,   // bMaxPower (100mA)
    // Interface descriptor
    9,    // bLength
    4,    // bDescriptorType (Interface)
    0,    // bInterfaceNumber
    0,    // bAlternateSetting
    1,    // bNumEndpoints
    3,    // bInterfaceClass (HID)
    1,    // bInterfaceSubClass (Boot)
    1,    // bInterfaceProtocol (Keyboard)
    0,    // iInterface
    // HID descriptor
    9,    // bLength
    0x21, // bDescriptorType (HID)
    0x11, 0x01, // bcdHID (1.11)
    0,    // bCountryCode
    1,    // bNumDescriptors
    0x22, // bDescriptorType (Report)
    HID_REPORT_DESCRIPTOR.len() as u8, 0, // wDescriptorLength
    // Endpoint descriptor (EP1 IN, interrupt)
    7,    // bLength
    5,    // bDescriptorType (Endpoint)
    0x81, // bEndpointAddress (EP1 IN)
    0x03, // bmAttributes (Interrupt)
    EP1_SIZE, 0, // wMaxPacketSize
    10,   // bInterval (10ms polling)
];

/// String descriptor 0 (language ID)
static STRING_DESC_0: [u8; 4] = [4, 3, 0x09, 0x04]; // English (US)

/// String descriptor 1 (manufacturer): "c64key"
static STRING_DESC_1: [u8; 14] = [
    14, 3, // bLength, bDescriptorType
    b'c', 0, b'6', 0, b'4', 0, b'k', 0, b'e', 0, b'y', 0,
];

/// String descriptor 2 (product): "C64 Keyboard"
static STRING_DESC_2: [u8; 26] = [
    26, 3, // bLength, bDescriptorType
    b'C', 0, b'6', 0, b'4', 0, b' ', 0, b'K', 0, b'e', 0, b'y', 0, b'b', 0, b'o', 0, b'a', 0,
    b'r', 0, b'd', 0,
];

/// Feature selector for SET_FEATURE / CLEAR_FEATURE.
const DEVICE_REMOTE_WAKEUP: u8 = 1;

/// Upper bound on polls while the controller drives resume signalling.
const WAKEUP_POLL_LIMIT: u16 = 0xFFFF;

/// USB device state.
pub struct UsbKeyboard<'a> {
    dp: &'a Peripherals,
    configured: bool,
    /// Host allowed remote wakeup with SET_FEATURE.
    wakeup_enabled: bool,
    frame_seen: bool,
    /// In 4ms units, 0 = report on change only.
    idle_rate: u8,
    /// 0 = boot protocol, 1 = report protocol.
    protocol: u8,
    /// Latest report handed in, answered to GET_REPORT.
    current: Report,
}

impl<'a> UsbKeyboard<'a> {
    pub fn new(dp: &'a Peripherals) -> Self {
        Self {
            dp,
            configured: false,
            wakeup_enabled: false,
            frame_seen: false,
            idle_rate: 0,
            protocol: 1,
            current: Report::empty(),
        }
    }

    /// Bring up the pad regulator, PLL and controller and attach to the bus.
    pub fn init(&mut self) {
        let dp = self.dp;
        let usb = &dp.USB_DEVICE;

        usb.uhwcon.write(|w| w.uvrege().set_bit());
        usb.usbcon
            .write(|w| w.usbe().set_bit().otgpade().set_bit());

        // 16MHz crystal -> 48MHz USB clock
        dp.PLL.pllcsr.write(|w| w.pindiv().set_bit().plle().set_bit());
        while dp.PLL.pllcsr.read().plock().bit_is_clear() {}

        usb.usbcon.modify(|_, w| w.frzclk().clear_bit());
        usb.udcon.modify(|_, w| w.detach().clear_bit());

        self.configured = false;
    }

    fn configure_ep0(&self) {
        let usb = &self.dp.USB_DEVICE;

        self.select_endpoint(0);
        usb.ueconx.write(|w| w.epen().set_bit());
        usb.uecfg0x.write(|w| w.eptype().bits(0b00));
        usb.uecfg1x.write(|w| w.epsize().bits(0b011).alloc().set_bit());
    }

    fn configure_ep1(&self) {
        let usb = &self.dp.USB_DEVICE;

        self.select_endpoint(1);
        usb.ueconx.write(|w| w.epen().set_bit());
        usb.uecfg0x
            .write(|w| w.eptype().bits(0b11).epdir().set_bit());
        usb.uecfg1x.write(|w| w.epsize().bits(0b000).alloc().set_bit());
    }

    fn select_endpoint(&self, ep: u8) {
        self.dp.USB_DEVICE.uenum.write(|w| w.bits(ep & 0x07));
    }

    /// Acknowledge a no-data control request with a zero-length IN packet.
    fn send_zlp(&self) {
        self.dp
            .USB_DEVICE
            .ueintx
            .modify(|_, w| w.txini().clear_bit());
    }

    fn handle_setup(&mut self) {
        let usb = &self.dp.USB_DEVICE;

        let bm_request_type = usb.uedatx.read().bits();
        let b_request = usb.uedatx.read().bits();
        let w_value_l = usb.uedatx.read().bits();
        let w_value_h = usb.uedatx.read().bits();
        let _w_index_l = usb.uedatx.read().bits();
        let _w_index_h = usb.uedatx.read().bits();
        let w_length_l = usb.uedatx.read().bits();
        let w_length_h = usb.uedatx.read().bits();

        usb.ueintx.modify(|_, w| w.rxstpi().clear_bit());

        let w_length = (w_length_h as u16) << 8 | w_length_l as u16;

        match (bm_request_type, b_request) {
            // GET_STATUS (device)
            (0x80, 0x00) => {
                let status = if self.wakeup_enabled { 0x02 } else { 0x00 };
                self.send_data(&[status, 0], w_length);
            }

            // CLEAR_FEATURE / SET_FEATURE (device)
            (0x00, 0x01) | (0x00, 0x03) if w_value_l == DEVICE_REMOTE_WAKEUP => {
                self.wakeup_enabled = b_request == 0x03;
                self.send_zlp();
            }

            // SET_ADDRESS
            (0x00, 0x05) => {
                self.send_zlp();
                while usb.ueintx.read().txini().bit_is_clear() {}
                usb.udaddr
                    .write(|w| w.uadd().bits(w_value_l & 0x7F).adden().set_bit());
            }

            // GET_DESCRIPTOR
            (0x80, 0x06) => match (w_value_h, w_value_l) {
                (1, _) => self.send_data(&DEVICE_DESCRIPTOR, w_length),
                (2, _) => self.send_data(&CONFIG_DESCRIPTOR, w_length),
                (3, 0) => self.send_data(&STRING_DESC_0, w_length),
                (3, 1) => self.send_data(&STRING_DESC_1, w_length),
                (3, 2) => self.send_data(&STRING_DESC_2, w_length),
                _ => self.stall(),
            },

            // GET_CONFIGURATION
            (0x80, 0x08) => {
                let value = if self.configured { 1 } else { 0 };
                self.send_data(&[value], w_length);
            }

            // SET_CONFIGURATION
            (0x00, 0x09) => {
                self.send_zlp();
                self.configure_ep1();
                self.configured = true;
            }

            // HID GET_DESCRIPTOR (interface-level)
            (0x81, 0x06) if w_value_h == 0x22 => {
                self.send_data(&HID_REPORT_DESCRIPTOR, w_length);
            }

            // HID GET_REPORT
            (0xA1, 0x01) => {
                let bytes = self.current.to_bytes();
                self.send_data(&bytes, w_length);
            }

            // HID GET_IDLE
            (0xA1, 0x02) => self.send_data(&[self.idle_rate], w_length),

            // HID GET_PROTOCOL
            (0xA1, 0x03) => self.send_data(&[self.protocol], w_length),

            // HID SET_REPORT: one byte of LED state, no LEDs to drive
            (0x21, 0x09) if w_length == 1 => {
                while usb.ueintx.read().rxouti().bit_is_clear() {}
                let _leds = usb.uedatx.read().bits();
                usb.ueintx.modify(|_, w| w.rxouti().clear_bit());
                self.send_zlp();
            }

            // HID SET_IDLE: duration in the high byte
            (0x21, 0x0A) => {
                self.idle_rate = w_value_h;
                self.send_zlp();
            }

            // HID SET_PROTOCOL
            (0x21, 0x0B) => {
                self.protocol = w_value_l;
                self.send_zlp();
            }

            _ => self.stall(),
        }
    }

    /// IN data stage on EP0, in packets of EP0_SIZE, truncated to what
    /// the host asked for.
    fn send_data(&self, data: &[u8], max_length: u16) {
        let usb = &self.dp.USB_DEVICE;
        let len = core::cmp::min(data.len(), max_length as usize);
        let mut sent = 0;

        while sent < len {
            while usb.ueintx.read().txini().bit_is_clear() {}

            let chunk_end = core::cmp::min(sent + EP0_SIZE as usize, len);
            for &byte in &data[sent..chunk_end] {
                usb.uedatx.write(|w| w.bits(byte));
            }

            usb.ueintx.modify(|_, w| w.txini().clear_bit());
            sent = chunk_end;
        }

        // Status stage: host sends ZLP
        while usb.ueintx.read().rxouti().bit_is_clear() {}
        usb.ueintx.modify(|_, w| w.rxouti().clear_bit());
    }

    fn stall(&self) {
        self.dp
            .USB_DEVICE
            .ueconx
            .modify(|_, w| w.stallrq().set_bit());
    }
}

impl HidTransport for UsbKeyboard<'_> {
    fn poll(&mut self) {
        let usb = &self.dp.USB_DEVICE;
        let udint = usb.udint.read();

        if udint.eorsti().bit_is_set() {
            usb.udint.modify(|_, w| w.eorsti().clear_bit());
            self.configure_ep0();
            self.configured = false;
            self.wakeup_enabled = false;
        }

        if udint.sofi().bit_is_set() {
            usb.udint.modify(|_, w| w.sofi().clear_bit());
            self.frame_seen = true;
        }

        self.select_endpoint(0);
        if usb.ueintx.read().rxstpi().bit_is_set() {
            self.handle_setup();
        }
    }

    fn take_frame_activity(&mut self) -> bool {
        core::mem::replace(&mut self.frame_seen, false)
    }

    fn idle_rate(&self) -> u8 {
        self.idle_rate
    }

    fn try_send(&mut self, report: &Report) -> bool {
        self.current = *report;
        if !self.configured {
            return false;
        }

        let usb = &self.dp.USB_DEVICE;
        self.select_endpoint(1);
        // RWAL clear: previous report not collected yet
        if usb.ueintx.read().rwal().bit_is_clear() {
            return false;
        }

        let bytes: [u8; REPORT_LEN] = report.to_bytes();
        for byte in bytes {
            usb.uedatx.write(|w| w.bits(byte));
        }
        usb.ueintx
            .modify(|_, w| w.fifocon().clear_bit().txini().clear_bit());
        true
    }
}

impl RemoteWakeup for UsbKeyboard<'_> {
    /// Drive resume (K state) on the bus. The controller times the signal
    /// itself; interrupts stay off until it reports completion. Sent even
    /// if the host never set DEVICE_REMOTE_WAKEUP: a lost keypress is worse
    /// than an ignored resume.
    fn remote_wakeup(&mut self) {
        let usb = &self.dp.USB_DEVICE;
        avr_device::interrupt::free(|_| {
            usb.udcon.modify(|_, w| w.rmwkup().set_bit());
            let mut polls = WAKEUP_POLL_LIMIT;
            while usb.udcon.read().rmwkup().bit_is_set() && polls > 0 {
                polls -= 1;
            }
        });
    }
}
