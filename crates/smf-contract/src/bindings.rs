//! Typed call builders for the `SecureMusicFlow` and `FHEEncryption` contracts.

use alloy_primitives::{Address, U256};
use alloy_sol_types::sol;

use crate::types::ContractCall;

sol! {
    #![sol(all_derives)]

    /// Registered track as returned by `getMusic(uint256)`.
    #[sol(all_derives)]
    struct Music {
        uint256 id;
        address artist;
        string encryptedMetadata;
        string ipfsHash;
        uint256 totalLicenses;
        uint256 totalRevenue;
        bool isActive;
        uint256 createdAt;
    }

    /// Key pair record as returned by `getUserKeyPair(address)`.
    #[sol(all_derives)]
    struct FHEKeyPair {
        string publicKey;
        string privateKeyHash;
        uint256 createdAt;
        bool isActive;
    }

    #[sol(all_derives)]
    interface ISecureMusicFlow {
        function updateFHEPublicKey(string newPublicKey) external;
        function registerMusic(
            string encryptedMetadata,
            string ipfsHash,
            address[] recipients,
            uint256[] percentages
        ) external;
        function purchaseLicense(uint256 musicId, uint256 licenseType, uint256 validUntil)
            external
            payable;
        function getTotalMusic() external view returns (uint256);
        function getMusic(uint256 musicId) external view returns (Music memory);
    }

    #[sol(all_derives)]
    interface IFHEEncryption {
        function generateFHEKeyPair(string publicKey, string privateKeyHash) external;
        function encryptData(string data, string dataHash, string encryptedData) external;
        function getUserKeyPair(address user) external view returns (FHEKeyPair memory);
    }
}

pub mod secure_music_flow {
    use super::*;

    pub use super::ISecureMusicFlow::{getMusicCall, getTotalMusicCall};
    pub use super::Music;

    pub const CONTRACT_NAME: &str = "SecureMusicFlow";

    pub fn update_fhe_public_key(public_key: &str) -> ContractCall {
        ContractCall::from_sol(&ISecureMusicFlow::updateFHEPublicKeyCall {
            newPublicKey: public_key.to_string(),
        })
    }

    pub fn register_music(
        encrypted_metadata: &str,
        ipfs_hash: &str,
        recipients: &[Address],
        percentages: &[U256],
    ) -> ContractCall {
        ContractCall::from_sol(&ISecureMusicFlow::registerMusicCall {
            encryptedMetadata: encrypted_metadata.to_string(),
            ipfsHash: ipfs_hash.to_string(),
            recipients: recipients.to_vec(),
            percentages: percentages.to_vec(),
        })
    }

    /// Payable; `price` is attached as the transaction value.
    pub fn purchase_license(
        music_id: U256,
        license_type: U256,
        valid_until: U256,
        price: U256,
    ) -> ContractCall {
        ContractCall::from_sol(&ISecureMusicFlow::purchaseLicenseCall {
            musicId: music_id,
            licenseType: license_type,
            validUntil: valid_until,
        })
        .with_value(price)
    }

    pub fn get_total_music() -> getTotalMusicCall {
        getTotalMusicCall {}
    }

    pub fn get_music(music_id: U256) -> getMusicCall {
        getMusicCall { musicId: music_id }
    }
}

pub mod fhe_encryption {
    use super::*;

    pub use super::IFHEEncryption::getUserKeyPairCall;
    pub use super::FHEKeyPair;

    pub const CONTRACT_NAME: &str = "FHEEncryption";

    pub fn generate_fhe_key_pair(public_key: &str, private_key_hash: &str) -> ContractCall {
        ContractCall::from_sol(&IFHEEncryption::generateFHEKeyPairCall {
            publicKey: public_key.to_string(),
            privateKeyHash: private_key_hash.to_string(),
        })
    }

    pub fn encrypt_data(data: &str, data_hash: &str, encrypted_data: &str) -> ContractCall {
        ContractCall::from_sol(&IFHEEncryption::encryptDataCall {
            data: data.to_string(),
            dataHash: data_hash.to_string(),
            encryptedData: encrypted_data.to_string(),
        })
    }

    pub fn get_user_key_pair(user: Address) -> getUserKeyPairCall {
        getUserKeyPairCall { user }
    }
}
