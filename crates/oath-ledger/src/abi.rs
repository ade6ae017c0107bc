//! # Contract ABI Bindings
//!
//! Solidity interfaces for the contracts the workflow talks to. Only the
//! functions and events the workflow actually reads or writes are declared.
//!
//! | Contract | Ledger | Used for |
//! |----------|--------|----------|
//! | `ISlaEnforcement` | home | agreement reads, breach and relay writes, `ClaimFiled` trigger |
//! | `IIdentityRegistry` | origin | registration-request events |
//! | `IReportForwarder` | home | signed report delivery |

use alloy_sol_types::sol;

sol! {
    #![sol(extra_derives(Debug))]

    #[sol(all_derives)]
    interface ISlaEnforcement {
        function slaCount() external view returns (uint256);

        function slas(uint256 id)
            external
            view
            returns (
                address provider,
                address tenant,
                uint256 bondAmount,
                uint256 responseTimeHrs,
                uint256 minUptimeBps,
                uint256 penaltyBps,
                uint256 createdAt,
                bool active
            );

        function recordBreach(uint256 slaId, uint256 uptimeBps, uint256 penaltyBps) external;

        function registerProviderRelayed(address subject, uint256 nullifierHash) external;

        function registerArbitratorRelayed(address subject, uint256 nullifierHash) external;

        event ClaimFiled(uint256 indexed claimId, uint256 indexed slaId, address tenant);
    }

    #[sol(all_derives)]
    interface IIdentityRegistry {
        event ProviderRegistrationRequested(
            address indexed user,
            uint256 indexed nullifierHash,
            uint256 root,
            uint256 timestamp
        );

        event ArbitratorRegistrationRequested(
            address indexed user,
            uint256 indexed nullifierHash,
            uint256 root,
            uint256 timestamp
        );
    }

    #[sol(all_derives)]
    interface IReportForwarder {
        function report(
            address receiver,
            bytes rawReport,
            bytes reportContext,
            bytes[] signatures
        ) external;
    }
}
