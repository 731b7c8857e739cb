//! Entry point of the `safe` command-line tool.
//!
//! Hashing commands work offline. `sign` and `exec` load a configuration file,
//! build the signers and the Safe account from it, and talk to the chain.

use alloy_primitives::{Address, Bytes};
use clap::Parser;
use safe_config::Config;
use safe_core::{aggregate, SafeToolkit, SigningMode};
use safe_types::{
	domain_separator, encode_dynamic_call, message_digest, transaction_digest, SafeTransaction,
	SignatureRecord,
};
use serde_json::json;
use std::path::Path;

mod cli;
mod factory_registry;

use cli::{Args, Command, ModeArg, TxArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	// stdout carries command output
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let output = match args.command {
		Command::Hash { safe, tx } => {
			let tx = tx.template()?.build()?;
			transaction_hash_output(safe, &tx)?
		},
		Command::MessageHash { safe, message } => message_hash_output(safe, &message)?,
		Command::Sign {
			config,
			tx,
			mode,
			skip_on_chain,
		} => {
			let toolkit = load_toolkit(&config).await?;
			sign(&toolkit, &tx, mode, skip_on_chain).await?
		},
		Command::Exec {
			config,
			to,
			sig,
			args,
			delegate,
			gas_limit,
		} => {
			let toolkit = load_toolkit(&config).await?;
			let data = encode_dynamic_call(&sig, &args)?;
			let result = toolkit
				.executor
				.execute_calldata_with_signers(
					to,
					data,
					&toolkit.signers.all(),
					delegate,
					&cli::overrides(gas_limit),
				)
				.await?;
			tracing::info!(tx_hash = %result.tx_hash, success = result.success, "Executed");
			serde_json::to_value(&result)?
		},
	};

	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

async fn load_toolkit(path: &Path) -> Result<SafeToolkit, Box<dyn std::error::Error>> {
	let path = path
		.to_str()
		.ok_or_else(|| format!("Config path is not valid UTF-8: {}", path.display()))?;
	let config = Config::from_file(path).await?;
	tracing::info!(safe = %config.safe.address, "Loaded configuration");

	let toolkit = factory_registry::build_toolkit_from_config(config).await?;
	tracing::info!(
		safe = %toolkit.safe,
		signers = toolkit.signers.len(),
		"Ready"
	);
	Ok(toolkit)
}

fn transaction_hash_output(
	safe: Address,
	tx: &SafeTransaction,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
	Ok(json!({
		"safe": safe,
		"domainSeparator": domain_separator(safe),
		"safeTxHash": transaction_digest(safe, tx)?,
		"transaction": tx,
	}))
}

fn message_hash_output(
	safe: Address,
	message: &Bytes,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
	Ok(json!({
		"safe": safe,
		"domainSeparator": domain_separator(safe),
		"messageHash": message_digest(safe, message)?,
	}))
}

/// Combines the configured default with `--mode` and `--skip-on-chain`.
///
/// `--skip-on-chain` only applies to pre-approval and overrides the configured value.
fn effective_mode(
	default: SigningMode,
	mode: Option<ModeArg>,
	skip_on_chain: bool,
) -> Result<SigningMode, String> {
	let mode = match mode {
		Some(mode) => mode.into_mode(skip_on_chain),
		None if skip_on_chain => match default {
			SigningMode::PreApproval { .. } => SigningMode::PreApproval {
				skip_on_chain: true,
			},
			other => other,
		},
		None => default,
	};

	if skip_on_chain && !matches!(mode, SigningMode::PreApproval { .. }) {
		return Err(format!(
			"--skip-on-chain requires pre-approval signing, but the mode is {:?}",
			mode
		));
	}
	Ok(mode)
}

async fn sign(
	toolkit: &SafeToolkit,
	tx_args: &TxArgs,
	mode: Option<ModeArg>,
	skip_on_chain: bool,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
	let mut template = tx_args.template()?;
	if template.nonce.is_none() {
		template.nonce = Some(toolkit.account.nonce().await?);
	}
	let tx = template.build()?;

	let mode = effective_mode(toolkit.default_mode, mode, skip_on_chain)?;
	let collection = toolkit
		.executor
		.collector()
		.collect(&toolkit.signers.all(), &tx, mode)
		.await?;
	for failure in &collection.failures {
		tracing::warn!(error = %failure, "Signer did not authorize");
	}
	let signatures = collection.into_result()?;

	let records: Vec<SignatureRecord> = signatures.iter().map(SignatureRecord::from).collect();
	Ok(json!({
		"safeTxHash": transaction_digest(toolkit.safe, &tx)?,
		"transaction": tx,
		"signatures": records,
		"aggregated": aggregate(&signatures)?,
	}))
}
