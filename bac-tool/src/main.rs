use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use icao_bac::bac::{AuthenticatorConfig, MutualAuthenticator};
use icao_bac::hex_string;
use icao_bac::iso7816::apdu::{Apdu, CommandHeader, Data, Response};
use icao_bac::iso7816::card::SmartCard;
use icao_bac::mrz::MrzKey;
use icao_bac::transport::{ApduChip, TransportError};
use tracing::{debug, info, trace};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;


/// Application identifier of the eMRTD LDS1 application.
const EMRTD_AID: [u8; 7] = [0xA0, 0x00, 0x00, 0x02, 0x47, 0x10, 0x01];


#[derive(Clone, Debug, Eq, Hash, Ord, Parser, PartialEq, PartialOrd)]
#[command(version, about)]
struct Opts {
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Subcommand)]
enum Mode {
    /// Lists the available PC/SC readers.
    ListReaders,

    /// Performs Basic Access Control with the document on a reader.
    Authenticate(AuthenticateOpts),
}

#[derive(Args, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
struct AuthenticateOpts {
    #[arg(short, long = "reader", default_value = "0")]
    pub reader_index: usize,

    /// The complete MRZ key: document number, date of birth and date of expiry, each followed by
    /// its check digit.
    #[arg(long, conflicts_with_all = ["document_number", "date_of_birth", "date_of_expiry"])]
    pub mrz_key: Option<String>,

    #[arg(long, requires_all = ["date_of_birth", "date_of_expiry"])]
    pub document_number: Option<String>,

    /// YYMMDD
    #[arg(long)]
    pub date_of_birth: Option<String>,

    /// YYMMDD
    #[arg(long)]
    pub date_of_expiry: Option<String>,

    /// Upper bound for each chip round trip in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Do not SELECT the eMRTD application first.
    #[arg(long)]
    pub skip_select: bool,

    /// Print the session keys in addition to the send sequence counter.
    #[arg(long)]
    pub show_keys: bool,
}
impl AuthenticateOpts {
    fn mrz_key(&self) -> Result<MrzKey, Box<dyn Error>> {
        if let Some(key_string) = &self.mrz_key {
            return Ok(MrzKey::from_key_string(key_string)?);
        }
        match (&self.document_number, &self.date_of_birth, &self.date_of_expiry) {
            (Some(doc), Some(dob), Some(doe)) => Ok(MrzKey::new(doc, dob, doe)?),
            _ => Err("either --mrz-key or all of --document-number, --date-of-birth and --date-of-expiry are required".into()),
        }
    }
}


/// A card in a PC/SC reader.
struct PcscCard(pcsc::Card);
#[async_trait]
impl SmartCard for PcscCard {
    async fn communicate(&mut self, request: &Apdu) -> Result<Response, TransportError> {
        let out_buf = request.to_bytes()?;
        trace!(request = %hex_string(&out_buf), "sending to card");
        let mut in_buf = vec![0u8; request.data.response_data_length().unwrap_or(0) + 2];
        let in_slice = self.0.transmit(&out_buf, &mut in_buf)
            .map_err(|e| TransportError::Reader(Box::new(e)))?;
        trace!(response = %hex_string(in_slice), "received from card");
        Response::from_slice(in_slice)
            .ok_or(TransportError::ShortResponse)
    }
}


fn hexdump(buf: &[u8]) {
    for (row, chunk) in buf.chunks(16).enumerate() {
        print!("{:08X}  ", row * 16);
        for i in 0..16 {
            match chunk.get(i) {
                Some(b) => print!(" {:02X}", b),
                None => print!("   "),
            }
        }

        print!(" |");
        for &b in chunk {
            if b.is_ascii_graphic() || b == b' ' {
                print!("{}", char::from(b));
            } else {
                print!(".");
            }
        }
        println!("|");
    }
}


fn connect_context() -> Result<pcsc::Context, Box<dyn Error>> {
    Ok(pcsc::Context::establish(pcsc::Scope::User)?)
}

fn list_readers(ctx: &pcsc::Context) -> Result<(), Box<dyn Error>> {
    let readers_buf_len = ctx.list_readers_len()?;
    let mut readers_buf = vec![0u8; readers_buf_len];
    for (i, reader) in ctx.list_readers(&mut readers_buf)?.enumerate() {
        println!("{}: {:?}", i, reader);
    }
    Ok(())
}

async fn select_emrtd_application(card: &mut PcscCard) -> Result<(), Box<dyn Error>> {
    let select_emrtd_app = Apdu {
        header: CommandHeader {
            cla: 0x00,
            ins: 0xA4, // SELECT
            p1: 0b000_001_00, // select by DF name (application identifier)
            p2: 0b0000_11_00, // return no metadata, return first or only occurrence
        },
        data: Data::RequestDataShort {
            request_data: EMRTD_AID.to_vec(),
        },
    };
    let response = card.communicate(&select_emrtd_app).await?;
    if !response.is_success() {
        return Err(format!(
            "obtained response 0x{:04X} when SELECTing eMRTD Application",
            response.trailer.to_word(),
        ).into());
    }
    debug!("eMRTD application selected");
    Ok(())
}

async fn authenticate(ctx: &pcsc::Context, opts: &AuthenticateOpts) -> Result<(), Box<dyn Error>> {
    let mrz_key = opts.mrz_key()?;

    let readers_buf_len = ctx.list_readers_len()?;
    let mut readers_buf = vec![0u8; readers_buf_len];
    let reader = ctx.list_readers(&mut readers_buf)?
        .nth(opts.reader_index)
        .ok_or_else(|| format!("no reader at index {}", opts.reader_index))?;
    let mut card = PcscCard(ctx.connect(reader, pcsc::ShareMode::Shared, pcsc::Protocols::ANY)?);
    info!(reader = ?reader, "connected to card");

    if !opts.skip_select {
        select_emrtd_application(&mut card).await?;
    }

    let config = AuthenticatorConfig {
        round_trip_timeout: opts.timeout_ms.map(Duration::from_millis),
    };
    let mut authenticator = MutualAuthenticator::from_mrz_key(&mrz_key)?
        .bind_transport(ApduChip::new(card))
        .with_config(config);
    let session_keys = authenticator.authenticate().await?;
    info!("BAC established");

    println!("SSC: {}", hex_string(session_keys.send_sequence_counter()));
    if opts.show_keys {
        println!("KS_enc:");
        hexdump(session_keys.enc_key());
        println!("KS_mac:");
        hexdump(session_keys.mac_key());
    }
    Ok(())
}


#[tokio::main]
async fn main() -> ExitCode {
    let opts = Opts::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&opts.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match connect_context() {
        Ok(ctx) => match &opts.mode {
            Mode::ListReaders => list_readers(&ctx),
            Mode::Authenticate(auth_opts) => authenticate(&ctx, auth_opts).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        },
    }
}
