//! Network and carrier signals

/// Active connection as reported by the platform connectivity service
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectivityType {
    Mobile,
    MobileDun,
    MobileHipri,
    MobileMms,
    MobileSupl,
    Wifi,
    Ethernet,
    Wimax,
    Bluetooth,
    /// Any other platform-specific type
    Other(i32),
}

/// Connection class sent as `ct`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NetworkType {
    #[default]
    Unknown,
    Ethernet,
    Wifi,
    Mobile,
}

impl NetworkType {
    /// Numeric code used on the wire
    pub fn code(self) -> u8 {
        match self {
            NetworkType::Unknown => 0,
            NetworkType::Ethernet => 1,
            NetworkType::Wifi => 2,
            NetworkType::Mobile => 3,
        }
    }

    /// Classify the active connection
    ///
    /// Without permission to read the network state the type is unknown.
    pub fn from_connectivity(active: Option<ConnectivityType>, permitted: bool) -> Self {
        if !permitted {
            return NetworkType::Unknown;
        }
        match active {
            Some(ConnectivityType::Ethernet) => NetworkType::Ethernet,
            Some(ConnectivityType::Wifi) => NetworkType::Wifi,
            Some(
                ConnectivityType::Mobile
                | ConnectivityType::MobileDun
                | ConnectivityType::MobileHipri
                | ConnectivityType::MobileMms
                | ConnectivityType::MobileSupl,
            ) => NetworkType::Mobile,
            _ => NetworkType::Unknown,
        }
    }
}

/// Radio technology of the phone
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PhoneType {
    #[default]
    None,
    Gsm,
    Cdma,
    Sip,
}

/// Telephony state relevant to ad targeting
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Telephony {
    pub phone_type: PhoneType,
    pub sim_ready: bool,
    /// MCC+MNC of the registered network
    pub network_operator: Option<String>,
    /// MCC+MNC of the SIM provider
    pub sim_operator: Option<String>,
    pub network_country_iso: Option<String>,
    pub network_operator_name: Option<String>,
}

impl Telephony {
    /// Operator code used for MCC/MNC
    ///
    /// CDMA phones report the registered network unreliably, so the SIM
    /// operator is used when the SIM is ready.
    pub fn operator(&self) -> Option<&str> {
        if self.phone_type == PhoneType::Cdma && self.sim_ready {
            self.sim_operator.as_deref()
        } else {
            self.network_operator.as_deref()
        }
    }

    /// Split the operator code into MCC and MNC
    pub fn mcc_mnc(&self) -> (String, String) {
        let Some(operator) = self.operator() else {
            return (String::new(), String::new());
        };
        let split = operator
            .char_indices()
            .nth(3)
            .map_or(operator.len(), |(index, _)| index);
        let (mcc, mnc) = operator.split_at(split);
        (mcc.to_string(), mnc.to_string())
    }
}
