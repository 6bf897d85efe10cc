use std::io::Read;

use pay_invoice::{config::Config, logging::init_tracing, InvoiceService};

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_tracing(&config.logging)?;

    tracing::info!("Starting invoice-finalize v{}", env!("CARGO_PKG_VERSION"));

    let input = match std::env::args().nth(1) {
        Some(path) if path != "-" => std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?,
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let service = InvoiceService::new(&config.invoicing);
    let mut invoice = service.invoice_from_json(&input)?;

    service.finalize(&mut invoice);

    println!("{}", serde_json::to_string_pretty(&invoice.to_value()?)?);

    Ok(())
}
