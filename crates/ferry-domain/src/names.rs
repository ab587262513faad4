//! Well-known type, relationship, property and classification names
//!
//! These follow the open metadata type system the repository understands.

/// Element type names
pub mod types {
    /// A directory on a file system
    pub const FILE_FOLDER: &str = "FileFolder";
    /// Generic data file, used when the extension is not recognised
    pub const DATA_FILE: &str = "DataFile";
    /// Comma separated values file
    pub const CSV_FILE: &str = "CSVFile";
    /// JSON document
    pub const JSON_FILE: &str = "JSONFile";
    /// Apache Parquet file
    pub const PARQUET_FILE: &str = "ParquetFile";
    /// Apache Avro file
    pub const AVRO_FILE: &str = "AvroFile";
    /// Plain text or log file
    pub const TEXT_FILE: &str = "TextFile";
    /// Audio, video or image file
    pub const MEDIA_FILE: &str = "MediaFile";
    /// Archive such as zip or tar
    pub const ARCHIVE_FILE: &str = "ArchiveFile";
    /// A process that moves or transforms data
    pub const PROCESS: &str = "Process";
    /// Connection describing how to reach an asset
    pub const CONNECTION: &str = "Connection";
    /// Network endpoint of a connection
    pub const ENDPOINT: &str = "Endpoint";
    /// Schema attached to an asset
    pub const SCHEMA_TYPE: &str = "SchemaType";
    /// One column or field of a schema
    pub const SCHEMA_ATTRIBUTE: &str = "SchemaAttribute";
    /// Named chain of processes data passes through
    pub const INFORMATION_SUPPLY_CHAIN: &str = "InformationSupplyChain";
}

/// Relationship type names
pub mod relationships {
    /// Folder (end 1) contains file (end 2)
    pub const NESTED_FILE: &str = "NestedFile";
    /// Parent folder (end 1) contains sub folder (end 2)
    pub const FOLDER_HIERARCHY: &str = "FolderHierarchy";
    /// Connection (end 1) describes how to reach asset (end 2)
    pub const CONNECTION_TO_ASSET: &str = "ConnectionToAsset";
    /// Endpoint (end 1) is used by connection (end 2)
    pub const CONNECTION_ENDPOINT: &str = "ConnectionEndpoint";
    /// Parent process (end 1) contains child process (end 2)
    pub const PROCESS_HIERARCHY: &str = "ProcessHierarchy";
    /// Data flows from end 1 to end 2
    pub const DATA_FLOW: &str = "DataFlow";
    /// Column-level mapping from end 1 to end 2
    pub const DATA_MAPPING: &str = "DataMapping";
    /// Asset (end 1) has schema type (end 2)
    pub const ASSET_SCHEMA_TYPE: &str = "AssetSchemaType";
    /// Schema type (end 1) has attribute (end 2)
    pub const ATTRIBUTE_FOR_SCHEMA: &str = "AttributeForSchema";
    /// Supply chain (end 1) is implemented by process (end 2)
    pub const INFORMATION_SUPPLY_CHAIN_LINK: &str = "InformationSupplyChainLink";
}

/// Property names
pub mod properties {
    /// Unique name of an element
    pub const QUALIFIED_NAME: &str = "qualifiedName";
    /// Short name
    pub const NAME: &str = "name";
    /// Name shown to people
    pub const DISPLAY_NAME: &str = "displayName";
    /// Location of a file or folder
    pub const PATH_NAME: &str = "pathName";
    /// Secondary location attribute used by some catalogued folders
    pub const RESOURCE_NAME: &str = "resourceName";
    /// Address of an endpoint
    pub const NETWORK_ADDRESS: &str = "networkAddress";
    /// Ordinal of a schema attribute
    pub const POSITION: &str = "position";
    /// File name without folder
    pub const FILE_NAME: &str = "fileName";
    /// Logical file type (e.g. "csv")
    pub const FILE_TYPE: &str = "fileType";
    /// File extension without the dot
    pub const FILE_EXTENSION: &str = "fileExtension";
    /// Technology label of the asset
    pub const DEPLOYED_IMPLEMENTATION_TYPE: &str = "deployedImplementationType";
    /// File creation time
    pub const CREATE_TIME: &str = "createTime";
    /// File modification time
    pub const MODIFIED_TIME: &str = "modifiedTime";
    /// File access time
    pub const ACCESS_TIME: &str = "accessTime";
    /// Free text description
    pub const DESCRIPTION: &str = "description";
}

/// Classification names
pub mod classifications {
    /// Marks an element as a template to copy from
    pub const TEMPLATE: &str = "Template";
}
