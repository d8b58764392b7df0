// Copyright Materialize, Inc. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository, or online at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::error::Error;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_test::{assert_de_tokens, assert_tokens, Token};

use bigdec::Decimal;

#[test]
fn test_serde_strings() -> Result<(), Box<dyn Error>> {
    // Strings carry the exact representation, scale included.
    for &s in &["-12.34", "1.20", "0E+5", "-Infinity", "NaN123"] {
        let d: Decimal = s.parse()?;
        assert_tokens(&d, &[Token::Str(s)]);
    }
    Ok(())
}

#[test]
fn test_serde_numbers() -> Result<(), Box<dyn Error>> {
    assert_de_tokens(&Decimal::from(1), &[Token::U64(1)]);
    assert_de_tokens(&Decimal::from(-2), &[Token::I64(-2)]);
    assert_de_tokens(&"0.5".parse::<Decimal>()?, &[Token::F64(0.5)]);
    Ok(())
}

#[test]
fn test_serde_json() -> Result<(), Box<dyn Error>> {
    let d: Decimal = "1.20".parse()?;
    assert_eq!(serde_json::to_string(&d)?, "\"1.20\"");
    assert_eq!(serde_json::from_str::<Decimal>("\"1.20\"")?, d);

    assert_eq!(serde_json::from_value::<Decimal>(json!(1))?, Decimal::from(1));
    assert_eq!(
        serde_json::from_value::<Decimal>(json!(-2))?,
        Decimal::from(-2)
    );
    assert_eq!(
        serde_json::from_value::<Decimal>(json!(u64::MAX))?,
        Decimal::from(u64::MAX)
    );
    assert_eq!(
        serde_json::from_value::<Decimal>(json!(0.5))?,
        "0.5".parse()?
    );

    // A bare JSON number passes through an f64, with the usual consequences.
    // Quote the number to keep it exact.
    assert_eq!(
        serde_json::from_str::<Decimal>("0.1")?.to_string(),
        "0.1000000000000000055511151231257827021181583404541015625"
    );
    assert_eq!(serde_json::from_str::<Decimal>("\"0.1\"")?.to_string(), "0.1");

    let err = serde_json::from_value::<Decimal>(json!(true)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid type: boolean `true`, expected a number or a decimal string"
    );
    Ok(())
}

#[test]
fn test_serde_derive() -> Result<(), Box<dyn Error>> {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Account {
        balance: Decimal,
    }

    let account = Account {
        balance: "12.34".parse()?,
    };
    let json = serde_json::to_string(&account)?;
    assert_eq!(json, "{\"balance\":\"12.34\"}");
    assert_eq!(serde_json::from_str::<Account>(&json)?, account);
    Ok(())
}
