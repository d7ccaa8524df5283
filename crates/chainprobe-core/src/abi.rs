//! ABI argument coercion and one-shot call encoding.
//!
//! Contract-call targets are configured with a JSON ABI holding exactly one
//! function and a list of positional string arguments. Everything here runs
//! once, at task construction: the calldata is built up front and reused on
//! every tick.
//!
//! # Usage
//! ```ignore
//! let call = PreparedCall::from_abi_json(ABI_JSON, &["0xd8dA...".into()])?;
//! let calldata = call.calldata(); // selector ++ encoded args
//! ```

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, Bytes, I256, U256};
use std::str::FromStr;

use crate::error::AbiError;

/// `balanceOf(address)` from ERC-20, used by the token-balance collector.
pub const ERC20_BALANCE_OF_ABI: &str = r#"[{
    "type": "function",
    "name": "balanceOf",
    "inputs": [{"name": "account", "type": "address"}],
    "outputs": [{"name": "", "type": "uint256"}],
    "stateMutability": "view"
}]"#;

/// The closed set of parameter categories the coercer understands.
///
/// Everything that is not an address, a bool or a sized integer falls back
/// to [`ParamKind::Raw`], whose string is handed to the ABI library's own
/// coercion (strings, bytes, arrays, tuples, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    Address,
    Bool,
    Int(usize),
    Uint(usize),
    Raw(DynSolType),
}

impl ParamKind {
    /// Classify a resolved Solidity type.
    pub fn classify(ty: &DynSolType) -> Self {
        match ty {
            DynSolType::Address => Self::Address,
            DynSolType::Bool => Self::Bool,
            DynSolType::Int(bits) => Self::Int(*bits),
            DynSolType::Uint(bits) => Self::Uint(*bits),
            other => Self::Raw(other.clone()),
        }
    }

    /// Solidity spelling of the type, for error messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Address => "address".into(),
            Self::Bool => "bool".into(),
            Self::Int(bits) => format!("int{bits}"),
            Self::Uint(bits) => format!("uint{bits}"),
            Self::Raw(ty) => ty.sol_type_name().into_owned(),
        }
    }

    /// Coerce a configured string argument into a typed ABI value.
    ///
    /// Integers are range-checked against their declared width; an
    /// out-of-range literal is an error, never silently wrapped.
    pub fn coerce(&self, raw: &str) -> Result<DynSolValue, AbiError> {
        let raw = raw.trim();
        match self {
            Self::Address => Address::from_str(raw)
                .map(DynSolValue::Address)
                .map_err(|e| self.invalid(raw, e.to_string())),
            Self::Bool => parse_bool(raw)
                .map(DynSolValue::Bool)
                .ok_or_else(|| self.invalid(raw, "expected true/false/1/0")),
            Self::Int(bits) => self.coerce_int(raw, *bits),
            Self::Uint(bits) => self.coerce_uint(raw, *bits),
            Self::Raw(ty) => ty.coerce_str(raw).map_err(|e| self.invalid(raw, e.to_string())),
        }
    }

    fn coerce_int(&self, raw: &str, bits: usize) -> Result<DynSolValue, AbiError> {
        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        let magnitude = parse_decimal(digits).map_err(|reason| self.invalid(raw, reason))?;

        // int<bits> spans [-2^(bits-1), 2^(bits-1) - 1].
        let limit = U256::from(1u8) << (bits - 1);
        let in_range = if negative {
            magnitude <= limit
        } else {
            magnitude < limit
        };
        if !in_range {
            return Err(self.out_of_range(raw));
        }

        let value = I256::from_raw(magnitude);
        let value = if negative { value.wrapping_neg() } else { value };
        Ok(DynSolValue::Int(value, bits))
    }

    fn coerce_uint(&self, raw: &str, bits: usize) -> Result<DynSolValue, AbiError> {
        if raw.starts_with('-') {
            return Err(self.out_of_range(raw));
        }
        let value = parse_decimal(raw.strip_prefix('+').unwrap_or(raw))
            .map_err(|reason| self.invalid(raw, reason))?;
        if bits < 256 && value >> bits != U256::ZERO {
            return Err(self.out_of_range(raw));
        }
        Ok(DynSolValue::Uint(value, bits))
    }

    fn invalid(&self, raw: &str, reason: impl Into<String>) -> AbiError {
        AbiError::InvalidArgument {
            ty: self.type_name(),
            value: raw.to_string(),
            reason: reason.into(),
        }
    }

    fn out_of_range(&self, raw: &str) -> AbiError {
        AbiError::OutOfRange {
            ty: self.type_name(),
            value: raw.to_string(),
        }
    }
}

fn parse_decimal(digits: &str) -> Result<U256, String> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err("expected a decimal integer".into());
    }
    U256::from_str_radix(digits, 10).map_err(|_| "does not fit in 256 bits".to_string())
}

/// Boolean spellings accepted in configuration files.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// A contract call whose calldata was encoded once and is reused per tick.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    function: Function,
    calldata: Bytes,
}

impl PreparedCall {
    /// Parse `abi_json`, select its only function and encode `args`.
    ///
    /// An ABI with zero functions or with more than one function is
    /// rejected; the function names are reported in sorted order.
    pub fn from_abi_json(abi_json: &str, args: &[String]) -> Result<Self, AbiError> {
        let abi: JsonAbi = serde_json::from_str(abi_json)?;
        let function = sole_function(&abi)?.clone();
        Self::encode(function, args)
    }

    /// ERC-20 `balanceOf(account)`.
    pub fn balance_of(account: &str) -> Result<Self, AbiError> {
        Self::from_abi_json(ERC20_BALANCE_OF_ABI, &[account.to_string()])
    }

    fn encode(function: Function, args: &[String]) -> Result<Self, AbiError> {
        if args.len() != function.inputs.len() {
            return Err(AbiError::ArgCount {
                function: function.name.clone(),
                expected: function.inputs.len(),
                got: args.len(),
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for (index, (param, arg)) in function.inputs.iter().zip(args).enumerate() {
            let ty = param.resolve().map_err(|e| AbiError::UnresolvedType {
                index,
                reason: e.to_string(),
            })?;
            values.push(ParamKind::classify(&ty).coerce(arg)?);
        }

        let mut calldata = function.selector().to_vec();
        calldata.extend_from_slice(&DynSolValue::Tuple(values).abi_encode_params());
        Ok(Self {
            function,
            calldata: calldata.into(),
        })
    }

    /// Name of the selected function.
    pub fn method_name(&self) -> &str {
        &self.function.name
    }

    /// Canonical signature, e.g. `balanceOf(address)`.
    pub fn signature(&self) -> String {
        self.function.signature()
    }

    /// `selector ++ abi_encode(args)`.
    pub fn calldata(&self) -> &Bytes {
        &self.calldata
    }
}

fn sole_function(abi: &JsonAbi) -> Result<&Function, AbiError> {
    let functions: Vec<&Function> = abi.functions().collect();
    match functions.as_slice() {
        [] => Err(AbiError::NoFunction),
        [only] => Ok(only),
        many => {
            let mut names: Vec<String> = many.iter().map(|f| f.signature()).collect();
            names.sort();
            Err(AbiError::AmbiguousFunction { names })
        }
    }
}
