//! Command-line arguments.

use alloy_primitives::{Address, Bytes, U256};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use safe_core::SigningMode;
use safe_types::{
	encode_dynamic_call, Operation, SafeTransactionTemplate, TransactionError, TxOverrides,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Hash, sign and execute Safe transactions", long_about = None)]
pub struct Args {
	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, global = true, default_value = "info")]
	pub log_level: String,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Print the domain separator and safeTxHash of a transaction.
	Hash {
		/// Address of the Safe
		#[arg(long)]
		safe: Address,
		#[command(flatten)]
		tx: TxArgs,
	},
	/// Print the SafeMessage digest of a hex-encoded message.
	MessageHash {
		#[arg(long)]
		safe: Address,
		#[arg(long)]
		message: Bytes,
	},
	/// Collect authorizations from the configured signers.
	Sign {
		/// Path to configuration file
		#[arg(short, long, default_value = "config.toml")]
		config: PathBuf,
		#[command(flatten)]
		tx: TxArgs,
		/// Overrides the configured signing mode
		#[arg(long, value_enum)]
		mode: Option<ModeArg>,
		/// Assume approveHash was already called; pre-approval mode only
		#[arg(long)]
		skip_on_chain: bool,
	},
	/// Sign a call with every configured signer and submit it.
	Exec {
		#[arg(short, long, default_value = "config.toml")]
		config: PathBuf,
		#[arg(long)]
		to: Address,
		/// Function signature, e.g. "transfer(address,uint256)"
		#[arg(long)]
		sig: String,
		/// Function arguments, in order
		#[arg(long, num_args = 0..)]
		args: Vec<String>,
		#[arg(long)]
		delegate: bool,
		#[arg(long)]
		gas_limit: Option<u64>,
	},
}

/// Fields of a Safe transaction. Anything unset takes the Safe default.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct TxArgs {
	#[arg(long)]
	pub to: Address,
	#[arg(long)]
	pub value: Option<U256>,
	/// Raw hex calldata
	#[arg(long, conflicts_with = "sig")]
	pub data: Option<Bytes>,
	/// Function signature to encode calldata from
	#[arg(long)]
	pub sig: Option<String>,
	#[arg(long, num_args = 0.., requires = "sig")]
	pub args: Vec<String>,
	#[arg(long)]
	pub delegate: bool,
	#[arg(long)]
	pub safe_tx_gas: Option<U256>,
	#[arg(long)]
	pub base_gas: Option<U256>,
	#[arg(long)]
	pub gas_price: Option<U256>,
	#[arg(long)]
	pub gas_token: Option<Address>,
	#[arg(long)]
	pub refund_receiver: Option<Address>,
	/// Safe nonce; read from the Safe when omitted and a config is given
	#[arg(long)]
	pub nonce: Option<U256>,
}

impl TxArgs {
	pub fn template(&self) -> Result<SafeTransactionTemplate, TransactionError> {
		let data = match (&self.data, &self.sig) {
			(Some(data), _) => Some(data.clone()),
			(None, Some(sig)) => Some(encode_dynamic_call(sig, &self.args)?),
			(None, None) => None,
		};

		Ok(SafeTransactionTemplate {
			to: Some(self.to),
			value: self.value,
			data,
			operation: Some(Operation::from_delegate(self.delegate)),
			safe_tx_gas: self.safe_tx_gas,
			base_gas: self.base_gas,
			gas_price: self.gas_price,
			gas_token: self.gas_token,
			refund_receiver: self.refund_receiver,
			nonce: self.nonce,
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
	TypedData,
	Prefixed,
	Approve,
}

impl ModeArg {
	pub fn into_mode(self, skip_on_chain: bool) -> SigningMode {
		match self {
			ModeArg::TypedData => SigningMode::TypedData,
			ModeArg::Prefixed => SigningMode::PrefixedMessage,
			ModeArg::Approve => SigningMode::PreApproval { skip_on_chain },
		}
	}
}

pub fn overrides(gas_limit: Option<u64>) -> TxOverrides {
	TxOverrides {
		gas_limit,
		..Default::default()
	}
}
